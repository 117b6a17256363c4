use crate::model::Roster;
use anyhow::Context;
use fd_lock::RwLock;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge un roster depuis un support.
    fn load(&self) -> anyhow::Result<Roster>;
    /// Sauvegarde de manière atomique.
    fn save(&self, roster: &Roster) -> anyhow::Result<()>;

    /// Exécute `f` sous verrou exclusif du support.
    ///
    /// Par défaut aucun verrou: le support n'est pas partagé hors du processus.
    fn exclusive<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        f()
    }
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Fichier voisin `<roster>.lock`: le roster lui-même est remplacé à chaque sauvegarde.
    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl Storage for JsonStorage {
    /// Un fichier absent est un roster vide.
    fn load(&self) -> anyhow::Result<Roster> {
        if !self.path.exists() {
            return Ok(Roster::default());
        }
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let roster: Roster = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(roster)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }

    /// Verrou consultatif (flock / LockFileEx) tenu pendant tout `f`, entre processus.
    fn exclusive<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<anyhow::Error>,
    {
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("opening {}", lock_path.display()))?;
        let mut lock = RwLock::new(file);
        let _guard = lock
            .write()
            .with_context(|| format!("locking {}", lock_path.display()))?;
        f()
    }
}

/// Stockage en mémoire (tests, aperçus).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    roster: Mutex<Roster>,
}

impl MemoryStorage {
    pub fn new(roster: Roster) -> Self {
        Self {
            roster: Mutex::new(roster),
        }
    }

    pub fn snapshot(&self) -> Roster {
        self.roster
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        Ok(self.snapshot())
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let mut guard = self
            .roster
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = roster.clone();
        Ok(())
    }
}
