//! This module provides the client-local key/value storage.
//!
//! It survives reloads by being mirrored into a JSON backing file.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::identity::{AccessCredential, OwnerKey};

/// Key under which the integration credential is stored
pub const CREDENTIAL_KEY: &str = "integration_credential";
/// Key under which the owner the integration credential was granted to is stored
pub const CREDENTIAL_OWNER_KEY: &str = "integration_credential_owner";
/// Key under which the language preference is stored
pub const LANGUAGE_KEY: &str = "language";


/// The display language of the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::Es
    }
}

impl FromStr for Language {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(format!("unsupported language {:?}", other)),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}


/// A key/value store local to this client
#[derive(Debug)]
pub struct LocalStorage {
    backing_file: Option<PathBuf>,
    data: Mutex<StoredData>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredData {
    entries: HashMap<String, String>,
}

impl LocalStorage {
    /// Initialize a storage from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let data = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(file)?,
        };

        Ok(Self{
            backing_file: Some(PathBuf::from(path)),
            data: Mutex::new(data),
        })
    }

    /// Initialize an empty storage, that will be saved to `path`
    pub fn new(path: &Path) -> Self {
        Self{
            backing_file: Some(PathBuf::from(path)),
            data: Mutex::new(StoredData::default()),
        }
    }

    /// Load `path` if it is valid, or start an empty storage there
    pub fn open_or_create(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(storage) => storage,
            Err(err) => {
                log::warn!("Invalid storage file: {}. Using an empty storage", err);
                Self::new(path)
            }
        }
    }

    /// A storage that is never saved anywhere
    pub fn in_memory() -> Self {
        Self{
            backing_file: None,
            data: Mutex::new(StoredData::default()),
        }
    }

    /// Store the current content to the backing file
    fn save_to_file(&self, data: &StoredData) {
        let path = match &self.backing_file {
            None => return,
            Some(path) => path,
        };
        let file = match std::fs::File::create(path) {
            Err(err) => {
                log::warn!("Unable to save file {:?}: {}", path, err);
                return;
            },
            Ok(f) => f,
        };

        if let Err(err) = serde_json::to_writer(file, data) {
            log::warn!("Unable to serialize: {}", err);
        };
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().entries.get(key).cloned()
    }

    pub fn set<S: ToString>(&self, key: &str, value: S) {
        let mut data = self.data.lock().unwrap();
        data.entries.insert(key.to_string(), value.to_string());
        self.save_to_file(&data);
    }

    pub fn remove(&self, key: &str) {
        let mut data = self.data.lock().unwrap();
        if data.entries.remove(key).is_some() {
            self.save_to_file(&data);
        }
    }

    /// The last known integration credential, if it was granted to `owner`
    pub fn credential_for(&self, owner: &OwnerKey) -> Option<AccessCredential> {
        let data = self.data.lock().unwrap();
        if data.entries.get(CREDENTIAL_OWNER_KEY).map(String::as_str) != Some(owner.as_str()) {
            return None;
        }
        data.entries.get(CREDENTIAL_KEY)
            .filter(|token| token.is_empty() == false)
            .map(AccessCredential::new)
    }

    /// Whether a credential is stored for anybody else than `owner`
    pub fn has_foreign_credential(&self, owner: &OwnerKey) -> bool {
        let data = self.data.lock().unwrap();
        data.entries.contains_key(CREDENTIAL_KEY)
            && data.entries.get(CREDENTIAL_OWNER_KEY).map(String::as_str) != Some(owner.as_str())
    }

    pub fn set_credential(&self, owner: &OwnerKey, credential: &AccessCredential) {
        let mut data = self.data.lock().unwrap();
        data.entries.insert(CREDENTIAL_KEY.to_string(), credential.token().to_string());
        data.entries.insert(CREDENTIAL_OWNER_KEY.to_string(), owner.to_string());
        self.save_to_file(&data);
    }

    pub fn clear_credential(&self) {
        let mut data = self.data.lock().unwrap();
        let removed_token = data.entries.remove(CREDENTIAL_KEY).is_some();
        let removed_owner = data.entries.remove(CREDENTIAL_OWNER_KEY).is_some();
        if removed_token || removed_owner {
            self.save_to_file(&data);
        }
    }

    /// The last selected language, or the default one
    pub fn language(&self) -> Language {
        match self.get(LANGUAGE_KEY) {
            None => Language::default(),
            Some(code) => code.parse().unwrap_or_else(|err| {
                log::warn!("Ignoring the stored language: {}", err);
                Language::default()
            }),
        }
    }

    pub fn set_language(&self, language: Language) {
        self.set(LANGUAGE_KEY, language.code());
    }
}
