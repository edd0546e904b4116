//! Sample command catalog.
//!
//! A complete stack generates one struct per command from the protocol
//! definition tables; this catalog carries the handful of commands needed to
//! bring a dongle up and to exercise both frame families.

pub mod ezsp;
pub mod zcl;

use crate::registry::FrameRegistry;

/// Register the EZSP frames in this catalog.
pub fn register_ezsp_frames(registry: &mut FrameRegistry) {
    registry.register_frame::<ezsp::VersionRequest>();
    registry.register_frame::<ezsp::VersionResponse>();
    registry.register_frame::<ezsp::AddEndpointRequest>();
    registry.register_frame::<ezsp::AddEndpointResponse>();
    registry.register_frame::<ezsp::NopRequest>();
    registry.register_frame::<ezsp::NopResponse>();
    registry.register_frame::<ezsp::StackStatusHandler>();
}

/// Register the ZCL frames in this catalog.
pub fn register_zcl_frames(registry: &mut FrameRegistry) {
    registry.register_frame::<zcl::ResetAlarmCommand>();
    registry.register_frame::<zcl::ResetAllAlarmsCommand>();
    registry.register_frame::<zcl::GetAlarmCommand>();
    registry.register_frame::<zcl::ResetAlarmLogCommand>();
    registry.register_frame::<zcl::AlarmCommand>();
    registry.register_frame::<zcl::GetAlarmResponse>();
    registry.register_frame::<zcl::FireCommand>();
    registry.register_frame::<zcl::ReadAttributesCommand>();
    registry.register_frame::<zcl::DiscoverAttributesExtendedResponse>();
}

/// Registry holding every EZSP frame in this catalog.
pub fn ezsp_registry() -> FrameRegistry {
    let mut registry = FrameRegistry::new();
    register_ezsp_frames(&mut registry);
    registry
}
