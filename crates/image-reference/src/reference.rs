//! Tagged image reference type
//!
//! Parsing and Docker Hub normalisation come from `oci_distribution`: a
//! reference without a registry host resolves to `docker.io`, and
//! single-component Docker Hub names live under `library/`. This type adds
//! the requirement that a reference carries a tag.

use crate::error::ReferenceError;
use oci_distribution::Reference;
use std::fmt;
use std::str::FromStr;

/// Digest algorithms and the hex length of their encoded form
const DIGEST_ALGORITHMS: [(&str, usize); 3] = [("sha256", 64), ("sha384", 96), ("sha512", 128)];

/// Length of a bare image ID (hex sha256 without algorithm prefix)
const IDENTIFIER_LENGTH: usize = 64;

/// A fully qualified, tagged image reference
///
/// The repository name is `domain/path`; an optional digest pins the
/// reference to a specific manifest in addition to the tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    domain: String,
    path: String,
    tag: String,
    digest: Option<String>,
}

impl ImageReference {
    /// Parse a reference string, requiring it to carry a tag
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::NotTagged`] for untagged and digest-only
    /// references, and the other variants for strings that violate the
    /// reference grammar.
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        if s.is_empty() {
            return Err(ReferenceError::NameEmpty);
        }
        // `sha256:<hex>` would otherwise read as repository `sha256` with a hex tag
        if is_digest_only(s) {
            return Err(ReferenceError::NotTagged(s.to_string()));
        }

        let reference = Reference::try_from(s.to_string())
            .map_err(|e| ReferenceError::from_parse(s, &e))?;

        let Some(tag) = reference.tag() else {
            return Err(ReferenceError::NotTagged(s.to_string()));
        };

        Ok(Self {
            domain: reference.registry().to_string(),
            path: reference.repository().to_string(),
            tag: tag.to_string(),
            digest: reference.digest().map(str::to_string),
        })
    }

    /// Registry host, including the port if one was given
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Repository path below the registry host
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fully qualified repository name (`domain/path`)
    pub fn name(&self) -> String {
        format!("{}/{}", self.domain, self.path)
    }

    /// Tag
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Digest, if the reference is pinned
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Return a copy of this reference carrying `tag`
    ///
    /// The repository name is never changed. A digest, if present, is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::InvalidTag`] if `tag` is not a valid tag.
    pub fn with_tag(&self, tag: &str) -> Result<Self, ReferenceError> {
        let name = self.name();
        match Self::parse(&format!("{name}:{tag}")) {
            Ok(retagged) if retagged.tag == tag && retagged.name() == name && retagged.digest.is_none() => {
                Ok(Self {
                    tag: retagged.tag,
                    ..self.clone()
                })
            }
            _ => Err(ReferenceError::InvalidTag(tag.to_string())),
        }
    }
}

impl FromStr for ImageReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.domain, self.path, self.tag)?;
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// A bare image ID or `algorithm:hex` digest with nothing naming a repository
fn is_digest_only(s: &str) -> bool {
    if s.len() == IDENTIFIER_LENGTH && is_lower_hex(s) {
        return true;
    }
    s.split_once(':').is_some_and(|(algorithm, encoded)| {
        DIGEST_ALGORITHMS
            .iter()
            .any(|&(name, len)| name == algorithm && encoded.len() == len)
            && is_lower_hex(encoded)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMATIC: &str = "376567988ad370138ad8b2698212367b8edcb69b5fd68c80be1f2ec7d603b4ba";

    fn sha256(fill: char) -> String {
        format!("sha256:{}", fill.to_string().repeat(64))
    }

    #[test]
    fn test_parse_factory_installer() {
        let image = format!("factory.talos.dev/installer/{SCHEMATIC}:v1.7.6");
        let reference = ImageReference::parse(&image).unwrap();

        assert_eq!(reference.domain(), "factory.talos.dev");
        assert_eq!(reference.path(), format!("installer/{SCHEMATIC}"));
        assert_eq!(reference.name(), format!("factory.talos.dev/installer/{SCHEMATIC}"));
        assert_eq!(reference.tag(), "v1.7.6");
        assert_eq!(reference.digest(), None);
        assert_eq!(reference.to_string(), image);
    }

    #[test]
    fn test_parse_normalises_docker_hub() {
        let official: ImageReference = "busybox:1.36".parse().unwrap();
        assert_eq!(official.to_string(), "docker.io/library/busybox:1.36");

        let user: ImageReference = "siderolabs/installer:v1.7.6".parse().unwrap();
        assert_eq!(user.name(), "docker.io/siderolabs/installer");
    }

    #[test]
    fn test_parse_registry_with_port() {
        let reference: ImageReference = "localhost:5000/installer/abc:v1.8.0".parse().unwrap();
        assert_eq!(reference.domain(), "localhost:5000");
        assert_eq!(reference.path(), "installer/abc");
        assert_eq!(reference.tag(), "v1.8.0");

    }

    #[test]
    fn test_parse_rejects_untagged() {
        let err = ImageReference::parse("ghcr.io/siderolabs/installer").unwrap_err();
        assert!(matches!(err, ReferenceError::NotTagged(_)));
    }

    #[test]
    fn test_parse_rejects_digest_only() {
        let image = format!("ghcr.io/siderolabs/installer@{}", sha256('a'));
        let err = ImageReference::parse(&image).unwrap_err();
        assert!(matches!(err, ReferenceError::NotTagged(_)));

        let err = ImageReference::parse(&"f".repeat(64)).unwrap_err();
        assert!(matches!(err, ReferenceError::NotTagged(_)));
    }

    #[test]
    fn test_parse_rejects_bare_digest() {
        for digest in [
            sha256('a'),
            format!("sha384:{}", "0".repeat(96)),
            format!("sha512:{}", "e".repeat(128)),
        ] {
            assert_eq!(
                ImageReference::parse(&digest),
                Err(ReferenceError::NotTagged(digest.clone()))
            );
        }
    }

    #[test]
    fn test_parse_accepts_hex_tag_on_named_repository() {
        let image = format!("installer:{}", "a".repeat(64));
        let reference = ImageReference::parse(&image).unwrap();
        assert_eq!(reference.name(), "docker.io/library/installer");
        assert_eq!(reference.tag(), "a".repeat(64));
    }

    #[test]
    fn test_parse_tag_and_digest() {
        let image = format!("ghcr.io/siderolabs/installer:v1.7.6@{}", sha256('b'));
        let reference = ImageReference::parse(&image).unwrap();
        assert_eq!(reference.tag(), "v1.7.6");
        assert_eq!(reference.digest(), Some(sha256('b').as_str()));
        assert_eq!(reference.to_string(), image);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ImageReference::parse(""), Err(ReferenceError::NameEmpty));
        assert!(ImageReference::parse("ghcr.io/Siderolabs/installer:v1").is_err());
        assert!(ImageReference::parse("ghcr.io/siderolabs/installer:.bad").is_err());
        assert!(ImageReference::parse("ghcr.io/siderolabs/installer:v1@sha256:abc").is_err());
        assert!(ImageReference::parse("ghcr.io//installer:v1").is_err());
        assert!(ImageReference::parse(":v1").is_err());
    }

    #[test]
    fn test_parse_rejects_long_name() {
        let image = format!("registry.example/{}:v1", "a".repeat(250));
        assert!(matches!(
            ImageReference::parse(&image),
            Err(ReferenceError::NameTooLong(_))
        ));
    }

    #[test]
    fn test_with_tag_keeps_name() {
        let reference: ImageReference = format!("factory.talos.dev/installer/{SCHEMATIC}:v1.7.6")
            .parse()
            .unwrap();
        let retagged = reference.with_tag("v1.8.0").unwrap();

        assert_eq!(retagged.name(), reference.name());
        assert_eq!(retagged.tag(), "v1.8.0");
        assert_eq!(
            retagged.to_string(),
            format!("factory.talos.dev/installer/{SCHEMATIC}:v1.8.0")
        );
    }

    #[test]
    fn test_with_tag_is_idempotent() {
        let reference: ImageReference = "registry.example/org/abcdef123456:v1.5.0".parse().unwrap();
        let once = reference.with_tag("v1.6.0").unwrap();
        let twice = once.with_tag("v1.6.0").unwrap();
        assert_eq!(once.to_string(), twice.to_string());
    }

    #[test]
    fn test_with_tag_keeps_digest() {
        let image = format!("ghcr.io/siderolabs/installer:v1.7.6@{}", sha256('c'));
        let retagged = ImageReference::parse(&image).unwrap().with_tag("v1.8.0").unwrap();
        assert_eq!(
            retagged.to_string(),
            format!("ghcr.io/siderolabs/installer:v1.8.0@{}", sha256('c'))
        );
    }

    #[test]
    fn test_with_tag_rejects_invalid_tag() {
        let reference: ImageReference = "ghcr.io/siderolabs/installer:v1.7.6".parse().unwrap();
        assert_eq!(
            reference.with_tag("v1/8"),
            Err(ReferenceError::InvalidTag("v1/8".to_string()))
        );
        assert!(reference.with_tag("").is_err());
    }
}
