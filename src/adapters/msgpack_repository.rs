//! MessagePack implementation of the policy repository.

use std::{fs::File, path::Path};

use crate::{Result, error::Error, learning::LearnedPolicy, ports::PolicyRepository};

/// MessagePack-based policy repository.
///
/// # Examples
///
/// ```no_run
/// use gmenv::adapters::MsgPackRepository;
/// use gmenv::ports::PolicyRepository;
/// use std::path::Path;
///
/// let repo = MsgPackRepository;
/// let policy = repo.load(Path::new("policy.msgpack"))?;
/// println!("{}", policy.parameters);
/// # Ok::<(), gmenv::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackRepository;

impl MsgPackRepository {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyRepository for MsgPackRepository {
    fn save(&self, policy: &LearnedPolicy, path: &Path) -> Result<()> {
        let mut file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;

        rmp_serde::encode::write(&mut file, policy).map_err(|e| Error::SerializationContext {
            operation: "serialize policy to MessagePack".to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }

    fn load(&self, path: &Path) -> Result<LearnedPolicy> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(&file).map_err(|e| Error::SerializationContext {
            operation: "deserialize policy from MessagePack".to_string(),
            message: e.to_string(),
        })
    }
}
