use std::fmt;

use uuid::Uuid;

/// The system's only external handle for an upload: a time-ordered (v7)
/// UUID, stored as `BINARY(16)` and surfaced to clients in canonical
/// hyphenated form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileUuid(Uuid);

#[derive(Debug, thiserror::Error)]
#[error("invalid file_uuid")]
pub struct InvalidFileUuid;

impl FileUuid {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Accepts both the canonical 36-character hyphenated form and a bare
    /// 32-character hex form, since clients send either.
    pub fn parse(s: &str) -> Result<Self, InvalidFileUuid> {
        let uuid = match s.len() {
            36 => Uuid::parse_str(s).map_err(|_| InvalidFileUuid)?,
            32 => Uuid::parse_str(&format!(
                "{}-{}-{}-{}-{}",
                &s[0..8],
                &s[8..12],
                &s[12..16],
                &s[16..20],
                &s[20..32]
            ))
            .map_err(|_| InvalidFileUuid)?,
            _ => return Err(InvalidFileUuid),
        };
        Ok(Self(uuid))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidFileUuid> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| InvalidFileUuid)?;
        Ok(Self(Uuid::from_bytes(arr)))
    }

    pub fn as_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Default for FileUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_hyphenated() {
        let u = FileUuid::new();
        let s = u.to_string();
        assert_eq!(FileUuid::parse(&s).unwrap(), u);
    }

    #[test]
    fn round_trips_bytes() {
        let u = FileUuid::new();
        let bytes = u.as_bytes();
        assert_eq!(FileUuid::from_bytes(&bytes).unwrap(), u);
    }

    #[test]
    fn accepts_bare_hex() {
        let u = FileUuid::new();
        let hex = u.to_string().replace('-', "");
        assert_eq!(FileUuid::parse(&hex).unwrap(), u);
    }

    #[test]
    fn rejects_garbage() {
        assert!(FileUuid::parse("not-a-uuid").is_err());
        assert!(FileUuid::parse("").is_err());
    }
}
