//! Named-entity tagging collaborators
//!
//! The pipeline never runs NER itself. It talks to a [`NerTagger`], which
//! returns one entity class per token (`PERSON`, `ORGANIZATION`, `O`, ...).
//!
//! - [`StanfordNerClient`] speaks the Stanford NER server socket protocol:
//!   one sentence per connection, answered with `word/CLASS` slash tags.
//! - [`GazetteerNerTagger`] tags from fixed name lists, for offline runs and tests.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::nlp::tokenizer::Tokenizer;
use crate::types::{Token, ORGANIZATION_CLASS, OUTSIDE_TAG, PERSON_CLASS};

/// Default Stanford NER server port used by the reference deployment
pub const DEFAULT_NER_PORT: u16 = 9199;

/// Tags one sentence with entity classes.
///
/// Errors are per-sentence: the runner logs them and moves on.
pub trait NerTagger: Send + Sync {
    fn tag(&self, sentence: &str) -> Result<Vec<Token>>;
}

// ============================================================================
// Stanford NER socket client
// ============================================================================

/// Client for a Stanford NER server (`edu.stanford.nlp.ie.NERServer`)
#[derive(Debug, Clone)]
pub struct StanfordNerClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl StanfordNerClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set connect/read/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn connect(&self) -> Result<TcpStream> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::tagging(format!("resolve {}:{}: {e}", self.host, self.port)))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
                        .map_err(|e| Error::tagging(format!("configure socket: {e}")))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(Error::tagging(match last_err {
            Some(e) => format!("connect {}:{}: {e}", self.host, self.port),
            None => format!("no address for {}:{}", self.host, self.port),
        }))
    }
}

impl NerTagger for StanfordNerClient {
    fn tag(&self, sentence: &str) -> Result<Vec<Token>> {
        let mut payload = sentence.replace(['\r', '\n'], " ");
        payload.push('\n');
        let mut stream = self.connect()?;

        stream
            .write_all(payload.as_bytes())
            .and_then(|_| stream.flush())
            .map_err(|e| Error::tagging(format!("send: {e}")))?;

        let mut reply = String::new();
        stream
            .read_to_string(&mut reply)
            .map_err(|e| Error::tagging(format!("receive: {e}")))?;

        parse_slash_tags(&reply)
    }
}

/// Parse `word/CLASS word/CLASS ...` output.
///
/// The split is on the last `/`, so words containing slashes survive.
pub fn parse_slash_tags(reply: &str) -> Result<Vec<Token>> {
    reply
        .split_whitespace()
        .map(|item| match item.rsplit_once('/') {
            Some((word, tag)) if !word.is_empty() && !tag.is_empty() => Ok(Token::new(word, tag)),
            _ => Err(Error::tagging(format!("malformed tagged token {item:?}"))),
        })
        .collect()
}

// ============================================================================
// Gazetteer tagger
// ============================================================================

/// Tags tokens found in fixed person/organization word lists
#[derive(Debug, Clone, Default)]
pub struct GazetteerNerTagger {
    tokenizer: Tokenizer,
    persons: FxHashSet<String>,
    organizations: FxHashSet<String>,
}

impl GazetteerNerTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Words tagged `PERSON` (exact, case-sensitive)
    pub fn with_persons(mut self, words: &[&str]) -> Self {
        self.persons.extend(words.iter().map(|w| w.to_string()));
        self
    }

    /// Words tagged `ORGANIZATION` (exact, case-sensitive)
    pub fn with_organizations(mut self, words: &[&str]) -> Self {
        self.organizations.extend(words.iter().map(|w| w.to_string()));
        self
    }
}

impl NerTagger for GazetteerNerTagger {
    fn tag(&self, sentence: &str) -> Result<Vec<Token>> {
        Ok(self
            .tokenizer
            .words(sentence)
            .into_iter()
            .map(|word| {
                let class = if self.persons.contains(&word) {
                    PERSON_CLASS
                } else if self.organizations.contains(&word) {
                    ORGANIZATION_CLASS
                } else {
                    OUTSIDE_TAG
                };
                Token::new(word, class)
            })
            .collect())
    }
}
