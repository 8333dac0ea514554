//! Uniqued resource identifier.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

const SCHEMA_DELIMITER: &str = "://";

/// All resources in crayon are identified by URIs like `schema://path/to/resource.ext`.
///
/// The raw string is the only thing stored; every component is a substring computed on
/// demand, and an absent delimiter yields an empty component instead of an error.
/// Equality and hashing are defined over the raw string, which makes `Uri` usable as a
/// cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uri {
    url: String,
}

impl Uri {
    /// Creates a new URI.
    #[inline]
    pub fn new<T: Into<String>>(url: T) -> Self {
        Uri { url: url.into() }
    }

    /// Expands `relative` against the location of `parent`. Returns `relative`
    /// unchanged if it has a schema already.
    pub fn expand(relative: &Uri, parent: &Uri) -> Uri {
        if relative.has_schema() {
            return relative.clone();
        }

        Uri::new(format!(
            "{}/{}",
            parent.url_without_file(),
            relative.path()
        ))
    }

    /// Composes the identifier of a subresource that lives inside `parent`.
    pub fn merge(parent: &Uri, subresource: &str) -> Uri {
        Uri::new(format!("{}#{}", parent.url_without_extension(), subresource))
    }

    /// The raw string.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn has_schema(&self) -> bool {
        self.url.contains(SCHEMA_DELIMITER)
    }

    pub fn schema(&self) -> &str {
        match self.url.find(SCHEMA_DELIMITER) {
            Some(index) => &self.url[..index],
            None => "",
        }
    }

    /// Everything after the schema delimiter, or the whole string for relative URIs.
    pub fn path(&self) -> &str {
        match self.url.find(SCHEMA_DELIMITER) {
            Some(index) => &self.url[(index + SCHEMA_DELIMITER.len())..],
            None => &self.url,
        }
    }

    pub fn folder(&self) -> &str {
        let path = self.path();
        match path.rfind('/') {
            Some(index) => &path[..index],
            None => "",
        }
    }

    pub fn filename(&self) -> &str {
        let path = self.path();
        match path.rfind('/') {
            Some(index) => &path[(index + 1)..],
            None => path,
        }
    }

    /// The substring after the last `.` of the filename.
    pub fn extension(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(index) => &filename[(index + 1)..],
            None => "",
        }
    }

    /// The substring after the last `#`, which names a subresource.
    pub fn subresource(&self) -> &str {
        match self.url.rfind('#') {
            Some(index) => &self.url[(index + 1)..],
            None => "",
        }
    }

    /// The URI up to (but excluding) the last `/`.
    pub fn url_without_file(&self) -> &str {
        match self.url.rfind('/') {
            Some(index) => &self.url[..index],
            None => "",
        }
    }

    /// The URI without `.extension`. URIs without extension are returned as is.
    pub fn url_without_extension(&self) -> &str {
        let extension = self.extension();
        if extension.is_empty() && !self.filename().ends_with('.') {
            &self.url
        } else {
            &self.url[..(self.url.len() - extension.len() - 1)]
        }
    }
}

impl std::ops::Deref for Uri {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.url
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl Borrow<str> for Uri {
    fn borrow(&self) -> &str {
        &self.url
    }
}

impl<'a> From<&'a str> for Uri {
    fn from(url: &'a str) -> Self {
        Uri::new(url)
    }
}

impl From<String> for Uri {
    fn from(url: String) -> Self {
        Uri::new(url)
    }
}

impl<'a> From<&'a Uri> for Uri {
    fn from(uri: &'a Uri) -> Self {
        uri.clone()
    }
}
