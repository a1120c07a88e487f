/// Entities of the BTS stack exchanging primitives through the message router
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy)]
pub enum GsmEntity {
    /// Physical layer / transceiver boundary
    Phy,
    /// TDMA multiframe scheduler and channel codec
    Sched,
    /// Data link layer (LAPDm) and above, on the control and traffic channels
    L2,
    /// Packet control unit, consumer of PDTCH/PTCCH blocks
    Pcu,
    /// Radio resource management, issues channel activation and mode commands
    Rsl,
    /// Cell broadcast centre, source of SMS-CB commands
    Cbc,
}
