/// RSL channel mode, speech/data indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RslCmode {
    #[default]
    Signalling,
    Speech,
    Data,
}

/// Channel mode of a traffic channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TchMode {
    #[default]
    Signalling,
    /// Full rate speech (GSM 06.10)
    SpeechV1,
    /// Enhanced full rate speech (GSM 06.60)
    SpeechEfr,
    /// Adaptive multi-rate speech
    SpeechAmr,
}

/// Ciphering algorithm of one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherAlgo {
    #[default]
    None,
    A5_1,
    A5_2,
    A5_3,
}

impl CipherAlgo {
    /// Maps the RSL algorithm identifier (1 = no ciphering, 2 = A5/1, ...)
    pub fn from_rsl(id: u8) -> Option<CipherAlgo> {
        match id {
            1 => Some(CipherAlgo::None),
            2 => Some(CipherAlgo::A5_1),
            3 => Some(CipherAlgo::A5_2),
            4 => Some(CipherAlgo::A5_3),
            _ => None,
        }
    }
}
