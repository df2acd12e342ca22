mod api;
pub mod packet;
pub mod period;
pub mod serializer;
pub mod timing;
pub mod tmds;

pub use api::{HdmiError, HdmiInitError, HdmiResult, HdmiTransmitter, PixelCycle};
