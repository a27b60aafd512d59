//! # rapid-title-extract
//!
//! Extracts (first name, last name, job title) entities from free-text
//! biographical records.
//!
//! Each record's text is split into sentences and tagged, either by an
//! external NER service plus a POS tagger or by POS tags alone. A cascaded
//! grammar then groups title words with the person name they belong to. The
//! resulting `NAMED_ENTITY` chunks are kept when their title part contains a
//! known keyword, and names and titles are normalized before the entity is
//! assembled with the record's contact and origin.
//!
//! ```no_run
//! use rapid_title_extract::{Pipeline, SourceRecord, StanfordNerClient, TitleKeywordSet};
//! use rapid_title_extract::pipeline::NoopObserver;
//!
//! let keywords = TitleKeywordSet::academic()?;
//! let pipeline = Pipeline::external(StanfordNerClient::new("localhost", 9199), keywords);
//! let record = SourceRecord::new("Professor Jane A Smith retired in 2019.", "", "");
//! for entity in pipeline.run(&record, &mut NoopObserver) {
//!     println!("{} {}: {}", entity.first_name, entity.last_name, entity.job_title);
//! }
//! # Ok::<(), rapid_title_extract::Error>(())
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod io;
pub mod keywords;
pub mod nlp;
pub mod pipeline;
pub mod types;

pub use config::ExtractorSpec;
pub use error::{Error, Result};
pub use io::{load_records, parse_records, EntitySink, JsonLinesSink};
pub use keywords::TitleKeywordSet;
pub use nlp::ner::{GazetteerNerTagger, NerTagger, StanfordNerClient};
pub use nlp::pos::{LexiconPosTagger, PosTagger};
pub use pipeline::{Pipeline, PipelineObserver};
pub use types::{Candidate, Entity, SourceRecord, Token};
