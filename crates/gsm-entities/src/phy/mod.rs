//! PHY boundary of the stack. Only the virtual transceiver is implemented here;
//! radio hardware is driven outside of this workspace.

pub mod virt_phy;

pub use virt_phy::VirtPhy;
