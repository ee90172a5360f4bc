use std::fmt;

/// Integer-coded queue states, carried verbatim from the design for
/// durability and for the sweeper's coarse range/equality queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum JobState {
    Ready = 0,
    Claimed = 10,
    Uploading = 20,
    Uploaded = 30,
    Committed = 40,
    Failed = 100,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown job state code {0}")]
pub struct UnknownJobState(pub i16);

impl JobState {
    pub const fn as_i16(self) -> i16 {
        self as i16
    }
}

impl TryFrom<i16> for JobState {
    type Error = UnknownJobState;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ready),
            10 => Ok(Self::Claimed),
            20 => Ok(Self::Uploading),
            30 => Ok(Self::Uploaded),
            40 => Ok(Self::Committed),
            100 => Ok(Self::Failed),
            other => Err(UnknownJobState(other)),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ready => "READY",
            Self::Claimed => "CLAIMED",
            Self::Uploading => "UPLOADING",
            Self::Uploaded => "UPLOADED",
            Self::Committed => "COMMITTED",
            Self::Failed => "FAILED",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_code() {
        for state in [
            JobState::Ready,
            JobState::Claimed,
            JobState::Uploading,
            JobState::Uploaded,
            JobState::Committed,
            JobState::Failed,
        ] {
            assert_eq!(JobState::try_from(state.as_i16()).unwrap(), state);
        }
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!(JobState::try_from(200).is_err());
        assert!(JobState::try_from(-1).is_err());
    }
}
