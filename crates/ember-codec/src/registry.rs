//! Frame constructor registry.

use std::collections::HashMap;

use crate::error::UnknownFrame;
use crate::frame::{Direction, Frame, FrameId};

/// Zero-argument constructor producing an empty frame ready to deserialize.
pub type FrameConstructor = fn() -> Box<dyn Frame>;

fn construct<F: Frame + Default>() -> Box<dyn Frame> {
    Box::new(F::default())
}

/// Maps frame identities to constructors.
///
/// Built once at startup and handed to the session by reference. Two tables
/// are kept: one keyed on the full [`FrameId`] and one keyed on
/// `(command_id, direction)` for generic frames whose group id is only known
/// at runtime. Lookups try the specific table first.
#[derive(Debug, Clone, Default)]
pub struct FrameRegistry {
    specific: HashMap<FrameId, FrameConstructor>,
    generic: HashMap<(u16, Direction), FrameConstructor>,
}

impl FrameRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a fixed frame identity.
    ///
    /// A later registration for the same identity replaces the earlier one.
    pub fn register(
        &mut self,
        group_id: u16,
        command_id: u16,
        direction: Direction,
        constructor: FrameConstructor,
    ) {
        let id = FrameId::new(group_id, command_id, direction);
        if self.specific.insert(id, constructor).is_some() {
            log::debug!("replaced frame constructor for {}", id);
        }
    }

    /// Register a constructor shared by every group.
    pub fn register_generic(
        &mut self,
        command_id: u16,
        direction: Direction,
        constructor: FrameConstructor,
    ) {
        if self
            .generic
            .insert((command_id, direction), constructor)
            .is_some()
        {
            log::debug!(
                "replaced generic frame constructor for command 0x{:02X} {}",
                command_id,
                direction
            );
        }
    }

    /// Register a frame type, taking its identity from `F::default()`.
    ///
    /// Frames reporting [`Frame::is_generic`] land in the generic table.
    pub fn register_frame<F: Frame + Default>(&mut self) {
        let prototype = F::default();
        let id = prototype.frame_id();
        if prototype.is_generic() {
            self.register_generic(id.command_id, id.direction, construct::<F>);
        } else {
            self.register(id.group_id, id.command_id, id.direction, construct::<F>);
        }
    }

    /// Find the constructor for a frame identity, falling back to the generic
    /// table when no group-specific entry exists.
    pub fn lookup(
        &self,
        group_id: u16,
        command_id: u16,
        direction: Direction,
    ) -> Result<FrameConstructor, UnknownFrame> {
        let id = FrameId::new(group_id, command_id, direction);
        self.specific
            .get(&id)
            .or_else(|| self.generic.get(&(command_id, direction)))
            .copied()
            .ok_or(UnknownFrame(id))
    }

    /// Find a constructor in the generic table only.
    pub fn lookup_generic(
        &self,
        command_id: u16,
        direction: Direction,
    ) -> Option<FrameConstructor> {
        self.generic.get(&(command_id, direction)).copied()
    }

    /// Construct an empty frame for `id`.
    ///
    /// Generic frames are stamped with the group id being decoded.
    pub fn instantiate(&self, id: FrameId) -> Result<Box<dyn Frame>, UnknownFrame> {
        let constructor = self.lookup(id.group_id, id.command_id, id.direction)?;
        let mut frame = constructor();
        if frame.is_generic() {
            frame.set_group_id(id.group_id);
        }
        Ok(frame)
    }

    /// Check if `id` resolves to a constructor.
    pub fn contains(&self, id: FrameId) -> bool {
        self.lookup(id.group_id, id.command_id, id.direction).is_ok()
    }

    /// Number of registered constructors across both tables.
    pub fn len(&self) -> usize {
        self.specific.len() + self.generic.len()
    }

    /// Check if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.generic.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeResult, EncodeError};
    use crate::field::{FieldReader, FieldWriter};

    #[derive(Debug, Default)]
    struct Fixed;

    impl Frame for Fixed {
        fn frame_id(&self) -> FrameId {
            FrameId::new(0x0006, 0x01, Direction::ToServer)
        }

        fn serialize(&self, _writer: &mut FieldWriter) -> Result<(), EncodeError> {
            Ok(())
        }

        fn deserialize(&mut self, _reader: &mut FieldReader<'_>) -> DecodeResult<()> {
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Shared {
        group_id: u16,
    }

    impl Frame for Shared {
        fn frame_id(&self) -> FrameId {
            FrameId::new(self.group_id, 0x01, Direction::ToServer)
        }

        fn is_generic(&self) -> bool {
            true
        }

        fn set_group_id(&mut self, group_id: u16) {
            self.group_id = group_id;
        }

        fn serialize(&self, _writer: &mut FieldWriter) -> Result<(), EncodeError> {
            Ok(())
        }

        fn deserialize(&mut self, _reader: &mut FieldReader<'_>) -> DecodeResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_specific_before_generic() {
        let mut registry = FrameRegistry::new();
        registry.register_frame::<Fixed>();
        registry.register_frame::<Shared>();
        assert_eq!(registry.len(), 2);

        let frame = registry
            .instantiate(FrameId::new(0x0006, 0x01, Direction::ToServer))
            .unwrap();
        assert!(frame.is::<Fixed>());

        let frame = registry
            .instantiate(FrameId::new(0x0300, 0x01, Direction::ToServer))
            .unwrap();
        assert_eq!(frame.downcast_ref::<Shared>().unwrap().group_id, 0x0300);
        assert_eq!(frame.frame_id().group_id, 0x0300);
    }

    #[test]
    fn test_unknown_frame() {
        let registry = FrameRegistry::new();
        assert!(registry.is_empty());
        let id = FrameId::new(0x0006, 0x01, Direction::ToClient);
        assert_eq!(registry.instantiate(id).unwrap_err(), UnknownFrame(id));
        assert!(!registry.contains(id));
    }

    #[test]
    fn test_direction_is_part_of_the_key() {
        let mut registry = FrameRegistry::new();
        registry.register_frame::<Fixed>();
        assert!(registry.contains(FrameId::new(0x0006, 0x01, Direction::ToServer)));
        assert!(!registry.contains(FrameId::new(0x0006, 0x01, Direction::ToClient)));
        assert!(registry.lookup_generic(0x01, Direction::ToServer).is_none());
    }
}
