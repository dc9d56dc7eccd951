//! Presentation callbacks

use crate::models::LeafId;

/// Receives notifications after the engine changes the order
///
/// Every method has an empty default so hosts implement only what they
/// render.
pub trait EngineObserver {
    /// An entry moved from one logical index to another
    fn on_reorder(&mut self, _old_index: usize, _new_index: usize) {}

    /// Stacking created a group
    fn on_group_created(&mut self, _name: &str, _members: &[LeafId]) {}

    /// A leaf joined an existing group
    fn on_merged_into_group(&mut self, _leaf: &LeafId, _group: &str) {}

    /// The dragged row took (`true`) or released (`false`) pointer capture
    fn on_pointer_capture(&mut self, _captured: bool) {}

    /// The visual layout changed for any other reason
    fn on_layout_changed(&mut self) {}
}

/// Observer that records every notification, for tests and debugging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingObserver {
    /// Notifications in arrival order
    pub events: Vec<ObservedEvent>,
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    /// See [`EngineObserver::on_reorder`]
    Reorder(usize, usize),
    /// See [`EngineObserver::on_group_created`]
    GroupCreated(String, Vec<LeafId>),
    /// See [`EngineObserver::on_merged_into_group`]
    Merged(LeafId, String),
    /// See [`EngineObserver::on_pointer_capture`]
    PointerCapture(bool),
    /// See [`EngineObserver::on_layout_changed`]
    LayoutChanged,
}

impl EngineObserver for RecordingObserver {
    fn on_reorder(&mut self, old_index: usize, new_index: usize) {
        self.events.push(ObservedEvent::Reorder(old_index, new_index));
    }

    fn on_group_created(&mut self, name: &str, members: &[LeafId]) {
        self.events
            .push(ObservedEvent::GroupCreated(name.to_string(), members.to_vec()));
    }

    fn on_merged_into_group(&mut self, leaf: &LeafId, group: &str) {
        self.events
            .push(ObservedEvent::Merged(leaf.clone(), group.to_string()));
    }

    fn on_pointer_capture(&mut self, captured: bool) {
        self.events.push(ObservedEvent::PointerCapture(captured));
    }

    fn on_layout_changed(&mut self) {
        self.events.push(ObservedEvent::LayoutChanged);
    }
}
