use std::collections::VecDeque;
use std::path::Path;

use eframe::egui::TextureHandle;

use crate::annotation::AnnotationLayer;
use crate::config::Config;
use crate::data::filter::{default_selection, filter};
use crate::data::loader;
use crate::data::model::{CellValue, Dataset, DerivedView};
use crate::image_source::{self, RasterImage};

// ---------------------------------------------------------------------------
// Selection cell and input event
// ---------------------------------------------------------------------------

/// The single process-wide selection. `None` means the dropdown was cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection(pub Option<CellValue>);

/// Emitted by the dropdown when the user picks (or clears) a value.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChanged {
    pub value: Option<CellValue>,
}

/// Consumer of recomputed views (the table panel).
pub trait ViewSink {
    fn present(&mut self, dataset: &Dataset, view: &DerivedView);
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// Dataset, selection and the view derived from them, independent of rendering.
pub struct ViewModel {
    dataset: Dataset,
    selection: Selection,
    view: DerivedView,
    recomputations: u64,
}

impl ViewModel {
    /// Take ownership of a freshly loaded dataset and compute the initial view
    /// for the default selection.
    pub fn new(dataset: Dataset) -> Self {
        let selection = Selection(default_selection(&dataset));
        let view = derive(&dataset, &selection);
        log::debug!(
            "initial selection {:?} matches {} of {} records",
            selection.0,
            view.len(),
            dataset.len()
        );
        Self {
            dataset,
            selection,
            view,
            recomputations: 1,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    /// How many times the view has been derived, the initial one included.
    pub fn recompute_count(&self) -> u64 {
        self.recomputations
    }

    /// Present the current view without recomputing it.
    pub fn present_current(&self, sink: &mut impl ViewSink) {
        sink.present(&self.dataset, &self.view);
    }

    /// Apply one selection change. Returns `false` when the event carries the
    /// value that is already selected; nothing is recomputed in that case.
    pub fn handle(&mut self, event: SelectionChanged, sink: &mut impl ViewSink) -> bool {
        if self.selection.0 == event.value {
            return false;
        }

        self.selection = Selection(event.value);
        self.view = derive(&self.dataset, &self.selection);
        self.recomputations += 1;
        log::debug!(
            "selection {:?} -> {} records",
            self.selection.0,
            self.view.len()
        );

        sink.present(&self.dataset, &self.view);
        true
    }

    /// Drain `queue` in arrival order, running each event to completion.
    /// Returns the number of events that changed the selection.
    pub fn pump(
        &mut self,
        queue: &mut VecDeque<SelectionChanged>,
        sink: &mut impl ViewSink,
    ) -> usize {
        let mut changed = 0;
        while let Some(event) = queue.pop_front() {
            if self.handle(event, sink) {
                changed += 1;
            }
        }
        changed
    }
}

fn derive(dataset: &Dataset, selection: &Selection) -> DerivedView {
    match &selection.0 {
        Some(value) => filter(dataset, value),
        None => DerivedView::default(),
    }
}

// ---------------------------------------------------------------------------
// Table sink
// ---------------------------------------------------------------------------

/// What the table panel currently displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    /// Dataset indices of the displayed rows.
    pub rows: Vec<usize>,
    pub selection: Option<CellValue>,
}

impl ViewSink for TableView {
    fn present(&mut self, _dataset: &Dataset, view: &DerivedView) {
        self.rows = view.indices.clone();
        self.selection = view.selection.clone();
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset with its selection (None if loading failed).
    pub session: Option<ViewModel>,

    /// Rows handed to the table by the last recomputation.
    pub table: TableView,

    /// Selection changes waiting to be applied.
    pub pending: VecDeque<SelectionChanged>,

    pub grouping_field: String,

    pub image: RasterImage,

    /// GPU texture for `image`, uploaded on first draw.
    pub texture: Option<TextureHandle>,

    pub annotations: AnnotationLayer,

    pub stroke_width: f32,

    pub erase_tolerance: f32,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build the initial state: load the configured (or bundled) dataset and
    /// the configured (or generated) image. Load failures end up in
    /// `status_message` rather than aborting startup.
    pub fn from_config(config: &Config) -> Self {
        let mut state = Self {
            session: None,
            table: TableView::default(),
            pending: VecDeque::new(),
            grouping_field: config.dataset.grouping_field.clone(),
            image: image_source::sample_image(),
            texture: None,
            annotations: AnnotationLayer::new(config.annotation.default_tool),
            stroke_width: config.annotation.stroke_width,
            erase_tolerance: config.annotation.erase_tolerance,
            status_message: None,
        };

        let dataset = match &config.dataset.path {
            Some(path) => loader::load_file(path, &state.grouping_field),
            None => loader::load_bundled(&state.grouping_field),
        };
        match dataset {
            Ok(ds) => state.set_dataset(ds),
            Err(e) => state.report_error("load dataset", &e),
        }

        if let Some(path) = &config.image.path {
            state.open_image(path);
        }

        state
    }

    /// Ingest a newly loaded dataset and show its default view.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        log::info!(
            "Loaded {} records with columns {:?}",
            dataset.len(),
            dataset.columns()
        );
        let session = ViewModel::new(dataset);
        session.present_current(&mut self.table);
        self.pending.clear();
        self.session = Some(session);
        self.status_message = None;
    }

    /// Load a dataset file, keeping the current one on failure.
    pub fn open_dataset(&mut self, path: &Path) {
        match loader::load_file(path, &self.grouping_field) {
            Ok(ds) => self.set_dataset(ds),
            Err(e) => self.report_error("load dataset", &e),
        }
    }

    /// Replace the image. Existing annotations belong to the old image and
    /// are dropped.
    pub fn set_image(&mut self, image: RasterImage) {
        log::info!(
            "Loaded image '{}' ({}x{})",
            image.name,
            image.width(),
            image.height()
        );
        self.image = image;
        self.texture = None;
        self.annotations.clear();
    }

    /// Load an image file, keeping the current one on failure.
    pub fn open_image(&mut self, path: &Path) {
        match image_source::load_image(path) {
            Ok(img) => self.set_image(img),
            Err(e) => self.report_error("load image", &e),
        }
    }

    /// Queue a selection change from the dropdown.
    pub fn request_selection(&mut self, value: Option<CellValue>) {
        self.pending.push_back(SelectionChanged { value });
    }

    /// Apply queued selection changes to the table. Returns how many of them
    /// changed the selection.
    pub fn process_events(&mut self) -> usize {
        match &mut self.session {
            Some(session) => session.pump(&mut self.pending, &mut self.table),
            None => {
                self.pending.clear();
                0
            }
        }
    }

    pub fn report_error(&mut self, action: &str, err: &anyhow::Error) {
        log::error!("Failed to {action}: {err:#}");
        self.status_message = Some(format!("Error: {err:#}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    #[derive(Default)]
    struct RecordingSink {
        presented: Vec<DerivedView>,
    }

    impl ViewSink for RecordingSink {
        fn present(&mut self, _dataset: &Dataset, view: &DerivedView) {
            self.presented.push(view.clone());
        }
    }

    fn sample() -> Dataset {
        let records = ["CA", "TX", "CA"]
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Record::from_pairs([
                    ("State", CellValue::from(*s)),
                    ("V", CellValue::Integer(i as i64 + 1)),
                ])
            })
            .collect();
        Dataset::new(vec!["State".into(), "V".into()], records, "State").unwrap()
    }

    fn change(value: &str) -> SelectionChanged {
        SelectionChanged {
            value: Some(value.into()),
        }
    }

    #[test]
    fn starts_on_first_distinct_value() {
        let vm = ViewModel::new(sample());
        assert_eq!(vm.selection(), &Selection(Some("CA".into())));
        assert_eq!(vm.view().indices, vec![0, 2]);
        assert_eq!(vm.recompute_count(), 1);
    }

    #[test]
    fn empty_dataset_has_no_selection() {
        let ds = Dataset::new(vec!["State".into()], Vec::new(), "State").unwrap();
        let vm = ViewModel::new(ds);
        assert_eq!(vm.selection(), &Selection(None));
        assert!(vm.view().is_empty());
    }

    #[test]
    fn each_change_recomputes_once_and_reaches_the_sink() {
        let mut vm = ViewModel::new(sample());
        let mut sink = RecordingSink::default();

        assert!(vm.handle(change("TX"), &mut sink));
        assert_eq!(vm.recompute_count(), 2);
        assert_eq!(sink.presented.len(), 1);
        assert_eq!(sink.presented[0].indices, vec![1]);
    }

    #[test]
    fn repeating_the_current_value_is_a_no_op() {
        let mut vm = ViewModel::new(sample());
        let mut sink = RecordingSink::default();

        assert!(!vm.handle(change("CA"), &mut sink));
        assert_eq!(vm.recompute_count(), 1);
        assert!(sink.presented.is_empty());
    }

    #[test]
    fn pump_handles_events_in_order() {
        let mut vm = ViewModel::new(sample());
        let mut sink = RecordingSink::default();
        let mut queue: VecDeque<_> = [change("TX"), change("TX"), change("NV"), change("CA")]
            .into_iter()
            .collect();

        assert_eq!(vm.pump(&mut queue, &mut sink), 3);
        assert!(queue.is_empty());

        let presented: Vec<Vec<usize>> = sink.presented.iter().map(|v| v.indices.clone()).collect();
        assert_eq!(presented, vec![vec![1], vec![], vec![0, 2]]);
        assert_eq!(vm.selection(), &Selection(Some("CA".into())));
    }

    #[test]
    fn clearing_the_selection_empties_the_view() {
        let mut vm = ViewModel::new(sample());
        let mut sink = RecordingSink::default();

        assert!(vm.handle(SelectionChanged { value: None }, &mut sink));
        assert!(vm.view().is_empty());
        assert_eq!(vm.view().selection, None);
        assert_eq!(vm.dataset().len(), 3);
    }

    #[test]
    fn app_state_starts_with_bundled_data_and_sample_image() {
        let state = AppState::from_config(&Config::default());
        let session = state.session.as_ref().unwrap();
        assert_eq!(session.dataset().len(), 8);
        assert_eq!(state.table.selection, Some(CellValue::from("California")));
        assert_eq!(state.table.rows, vec![0]);
        assert_eq!(state.image.name, "sample");
        assert!(state.status_message.is_none());
    }

    #[test]
    fn queued_selection_reaches_the_table() {
        let mut state = AppState::from_config(&Config::default());
        state.request_selection(Some("Nevada".into()));
        state.request_selection(Some("Nevada".into()));
        assert_eq!(state.process_events(), 1);
        assert_eq!(state.table.rows, vec![2]);

        state.request_selection(Some("Oregon".into()));
        state.process_events();
        assert!(state.table.rows.is_empty());
        assert!(state.pending.is_empty());
    }

    #[test]
    fn failed_dataset_load_is_reported() {
        let mut config = Config::default();
        config.dataset.path = Some("missing/solar.csv".into());
        let state = AppState::from_config(&config);
        assert!(state.session.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
    }

    #[test]
    fn new_image_drops_annotations() {
        let mut state = AppState::from_config(&Config::default());
        state.annotations.begin((0.0, 0.0));
        state.annotations.extend((20.0, 20.0));
        state.annotations.finish();
        assert_eq!(state.annotations.len(), 1);

        state.set_image(image_source::sample_image());
        assert!(state.annotations.is_empty());
        assert!(state.texture.is_none());
    }
}
