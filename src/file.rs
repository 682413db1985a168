use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::trace;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::entry::{Attributes, Item};
use crate::error::{Error, Result};

/// New file content, either text (stored as UTF-8) or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content<'a> {
    Text(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
}

impl<'a> Content<'a> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Bytes(bytes) => bytes,
        }
    }
}

impl<'a> From<&'a str> for Content<'a> {
    fn from(text: &'a str) -> Self {
        Content::Text(Cow::Borrowed(text))
    }
}

impl From<String> for Content<'static> {
    fn from(text: String) -> Self {
        Content::Text(Cow::Owned(text))
    }
}

impl<'a> From<&'a [u8]> for Content<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Content::Bytes(Cow::Borrowed(bytes))
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Content<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Content::Bytes(Cow::Borrowed(&bytes[..]))
    }
}

impl From<Vec<u8>> for Content<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Content::Bytes(Cow::Owned(bytes))
    }
}

/// Content arriving as a dynamically typed value: a string, or an array of byte values.
impl<'a> TryFrom<&'a Value> for Content<'a> {
    type Error = Error;

    fn try_from(value: &'a Value) -> Result<Self> {
        let invalid = || Error::InvalidArgument("content must be a string or byte sequence".to_string());
        match value {
            Value::String(text) => Ok(Content::Text(Cow::Borrowed(text.as_str()))),
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()).ok_or_else(invalid))
                .collect::<Result<Vec<u8>>>()
                .map(|bytes| Content::Bytes(Cow::Owned(bytes))),
            _ => Err(invalid()),
        }
    }
}

/// A file whose content lives entirely in the backing store.
#[derive(Debug, Clone)]
pub struct File {
    item: Item,
}

impl File {
    pub fn new<P: Into<PathBuf>>(path: P, bridge: Arc<Bridge>) -> File {
        File {
            item: Item::new(path.into(), bridge),
        }
    }

    /// The whole backing file.
    pub fn content(&self) -> Result<Vec<u8>> {
        let path = self.item.path();
        trace!("read {}", path.display());
        Ok(self.item.bridge().elevated(|| fs::read(path))?)
    }

    /// Replace the whole backing file with `content`.
    pub fn set_content<'a, C: Into<Content<'a>>>(&self, content: C) -> Result<()> {
        let content = content.into();
        let path = self.item.path();
        trace!("write {} bytes to {}", content.as_bytes().len(), path.display());
        self.item
            .bridge()
            .elevated(|| fs::write(path, content.as_bytes()))?;
        Ok(())
    }
}

impl Attributes for File {
    fn item(&self) -> &Item {
        &self.item
    }

    fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }
}
