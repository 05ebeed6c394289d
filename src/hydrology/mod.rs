pub mod channel;
pub mod floodplain;
pub mod infiltration;
pub mod interception;
pub mod overland;
pub mod shear;
