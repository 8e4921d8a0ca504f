use std::cell::Cell;

use bevy::prelude::*;

use crate::engine::store::customization_state::{CustomizationState, DecalKind};

/// Individually observable fields of [`CustomizationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    IntroVisible = 0,
    BaseColour = 1,
    LogoEnabled = 2,
    FullEnabled = 3,
    LogoImage = 4,
    FullImage = 5,
    FreshUpload = 6,
}

impl StateField {
    pub const ALL: [StateField; 7] = [
        StateField::IntroVisible,
        StateField::BaseColour,
        StateField::LogoEnabled,
        StateField::FullEnabled,
        StateField::LogoImage,
        StateField::FullImage,
        StateField::FreshUpload,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::IntroVisible => "intro_visible",
            Self::BaseColour => "base_colour",
            Self::LogoEnabled => "logo_enabled",
            Self::FullEnabled => "full_enabled",
            Self::LogoImage => "logo_image",
            Self::FullImage => "full_image",
            Self::FreshUpload => "fresh_upload",
        }
    }
}

/// Compact set of [`StateField`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u8);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);

    pub fn of(fields: &[StateField]) -> Self {
        fields.iter().fold(Self::EMPTY, |set, field| set.with(*field))
    }

    pub fn with(self, field: StateField) -> Self {
        Self(self.0 | field.bit())
    }

    pub fn contains(&self, field: StateField) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = StateField> {
        StateField::ALL
            .into_iter()
            .filter(move |field| self.contains(*field))
    }
}

/// Handle returned by [`CustomizationStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

#[derive(Debug)]
struct Subscription {
    name: &'static str,
    dependencies: FieldSet,
    dirty: bool,
}

/// Read-only view handed to a tracked pass. Every accessor records the field
/// it touched so the store knows what the subscriber depends on.
pub struct Snapshot<'a> {
    state: &'a CustomizationState,
    reads: Cell<FieldSet>,
}

impl<'a> Snapshot<'a> {
    fn new(state: &'a CustomizationState) -> Self {
        Self {
            state,
            reads: Cell::new(FieldSet::EMPTY),
        }
    }

    fn read(&self, field: StateField) {
        self.reads.set(self.reads.get().with(field));
    }

    pub fn intro_visible(&self) -> bool {
        self.read(StateField::IntroVisible);
        self.state.intro_visible
    }

    pub fn base_colour(&self) -> &'a str {
        self.read(StateField::BaseColour);
        &self.state.base_colour
    }

    pub fn logo_enabled(&self) -> bool {
        self.read(StateField::LogoEnabled);
        self.state.logo_enabled
    }

    pub fn full_enabled(&self) -> bool {
        self.read(StateField::FullEnabled);
        self.state.full_enabled
    }

    pub fn logo_image(&self) -> &'a str {
        self.read(StateField::LogoImage);
        &self.state.logo_image
    }

    pub fn full_image(&self) -> &'a str {
        self.read(StateField::FullImage);
        &self.state.full_image
    }

    pub fn fresh_upload(&self) -> bool {
        self.read(StateField::FreshUpload);
        self.state.fresh_upload
    }

    pub fn decal_enabled(&self, kind: DecalKind) -> bool {
        match kind {
            DecalKind::Logo => self.logo_enabled(),
            DecalKind::Full => self.full_enabled(),
        }
    }

    pub fn decal_image(&self, kind: DecalKind) -> &'a str {
        match kind {
            DecalKind::Logo => self.logo_image(),
            DecalKind::Full => self.full_image(),
        }
    }
}

/// The session-wide customization store.
///
/// Mutations apply immediately, last write wins per field. Writing a value
/// equal to the current one is not a change.
#[derive(Resource, Debug, Default)]
pub struct CustomizationStore {
    state: CustomizationState,
    subscriptions: Vec<Subscription>,
    // Fields changed since the last `take_changes`, for frontend notifications.
    pending_changes: FieldSet,
}

impl CustomizationStore {
    /// Register a dependent computation. New subscribers start dirty so their
    /// first pass always runs.
    pub fn subscribe(&mut self, name: &'static str) -> SubscriberId {
        self.subscriptions.push(Subscription {
            name,
            dependencies: FieldSet::EMPTY,
            dirty: true,
        });
        debug!("Store subscriber registered: {}", name);
        SubscriberId(self.subscriptions.len() - 1)
    }

    pub fn is_dirty(&self, id: SubscriberId) -> bool {
        self.subscriptions.get(id.0).is_some_and(|s| s.dirty)
    }

    /// Fields read on the subscriber's last tracked pass.
    pub fn dependencies(&self, id: SubscriberId) -> FieldSet {
        self.subscriptions
            .get(id.0)
            .map_or(FieldSet::EMPTY, |s| s.dependencies)
    }

    /// Run a tracked pass for `id`. Clears the dirty flag and replaces the
    /// subscriber's dependencies with exactly the fields `pass` read.
    pub fn track<R>(&mut self, id: SubscriberId, pass: impl FnOnce(&Snapshot) -> R) -> R {
        let snapshot = Snapshot::new(&self.state);
        let result = pass(&snapshot);
        let reads = snapshot.reads.get();

        if let Some(subscription) = self.subscriptions.get_mut(id.0) {
            subscription.dependencies = reads;
            subscription.dirty = false;
        }
        result
    }

    /// Untracked read of the whole record.
    pub fn peek(&self) -> &CustomizationState {
        &self.state
    }

    /// Drain the set of fields changed since the previous call.
    pub fn take_changes(&mut self) -> FieldSet {
        std::mem::take(&mut self.pending_changes)
    }

    pub fn set_intro_visible(&mut self, visible: bool) -> bool {
        self.write(StateField::IntroVisible, |s| &mut s.intro_visible, visible)
    }

    pub fn set_base_colour(&mut self, colour: impl Into<String>) -> bool {
        self.write(StateField::BaseColour, |s| &mut s.base_colour, colour.into())
    }

    pub fn set_decal_enabled(&mut self, kind: DecalKind, enabled: bool) -> bool {
        match kind {
            DecalKind::Logo => self.write(StateField::LogoEnabled, |s| &mut s.logo_enabled, enabled),
            DecalKind::Full => self.write(StateField::FullEnabled, |s| &mut s.full_enabled, enabled),
        }
    }

    pub fn set_decal_image(&mut self, kind: DecalKind, locator: impl Into<String>) -> bool {
        match kind {
            DecalKind::Logo => self.write(StateField::LogoImage, |s| &mut s.logo_image, locator.into()),
            DecalKind::Full => self.write(StateField::FullImage, |s| &mut s.full_image, locator.into()),
        }
    }

    pub fn set_fresh_upload(&mut self, fresh: bool) -> bool {
        self.write(StateField::FreshUpload, |s| &mut s.fresh_upload, fresh)
    }

    fn write<T: PartialEq>(
        &mut self,
        field: StateField,
        slot: impl FnOnce(&mut CustomizationState) -> &mut T,
        value: T,
    ) -> bool {
        let target = slot(&mut self.state);
        if *target == value {
            return false;
        }
        *target = value;
        self.notify(field);
        true
    }

    fn notify(&mut self, field: StateField) {
        self.pending_changes = self.pending_changes.with(field);
        for subscription in &mut self.subscriptions {
            if subscription.dependencies.contains(field) && !subscription.dirty {
                subscription.dirty = true;
                trace!("{} changed, {} marked dirty", field.name(), subscription.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscriber_is_dirty_until_first_pass() {
        let mut store = CustomizationStore::default();
        let id = store.subscribe("colour");
        assert!(store.is_dirty(id));

        store.track(id, |snap| snap.base_colour().to_string());
        assert!(!store.is_dirty(id));
        assert_eq!(store.dependencies(id), FieldSet::of(&[StateField::BaseColour]));
    }

    #[test]
    fn mutation_only_notifies_subscribers_that_read_the_field() {
        let mut store = CustomizationStore::default();
        let colour = store.subscribe("colour");
        let decals = store.subscribe("decals");
        store.track(colour, |snap| {
            snap.base_colour();
        });
        store.track(decals, |snap| {
            snap.logo_enabled();
            snap.full_enabled();
        });

        assert!(store.set_decal_enabled(DecalKind::Full, true));
        assert!(store.is_dirty(decals));
        assert!(!store.is_dirty(colour));

        assert!(store.set_base_colour("#ff0000"));
        assert!(store.is_dirty(colour));
    }

    #[test]
    fn writing_the_current_value_is_not_a_change() {
        let mut store = CustomizationStore::default();
        let id = store.subscribe("intro");
        store.track(id, |snap| snap.intro_visible());

        assert!(!store.set_intro_visible(true));
        assert!(!store.is_dirty(id));
        assert!(store.take_changes().is_empty());
    }

    #[test]
    fn dependencies_are_replaced_by_each_pass() {
        let mut store = CustomizationStore::default();
        let id = store.subscribe("conditional");

        // Reads the logo image only while the logo is enabled.
        fn pass(snap: &Snapshot) {
            if snap.logo_enabled() {
                snap.logo_image();
            }
        }
        store.track(id, pass);
        store.set_decal_image(DecalKind::Logo, "a.png");
        assert!(!store.is_dirty(id));

        store.set_decal_enabled(DecalKind::Logo, true);
        store.track(id, pass);
        store.set_decal_image(DecalKind::Logo, "b.png");
        assert!(store.is_dirty(id));
    }

    #[test]
    fn last_write_wins_and_values_are_not_validated() {
        let mut store = CustomizationStore::default();
        store.set_base_colour("#123456");
        store.set_base_colour("not a colour");
        assert_eq!(store.peek().base_colour, "not a colour");

        let changes = store.take_changes();
        assert_eq!(changes.iter().collect::<Vec<_>>(), vec![StateField::BaseColour]);
        assert!(store.take_changes().is_empty());
    }
}
