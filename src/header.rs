//! Combined spectrum metadata
//!
//! The header is an ordered list of `key = value / comment` cards.
//! Free text comments are cards with the `COMMENT` key.

use std::{fmt, fs::File, io, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Key of the free text comment cards
pub const COMMENT: &str = "COMMENT";

/// Header card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub key: String,
    pub value: String,
    pub comment: String,
}

/// Ordered header cards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header(Vec<Card>);
impl Header {
    pub fn new() -> Self {
        Default::default()
    }
    /// Sets the value of a card, replacing the card with the same key if any
    pub fn set<K: Into<String>, V: ToString, C: Into<String>>(
        &mut self,
        key: K,
        value: V,
        comment: C,
    ) -> &mut Self {
        let card = Card {
            key: key.into(),
            value: value.to_string(),
            comment: comment.into(),
        };
        match self.0.iter_mut().find(|c| c.key == card.key) {
            Some(c) => *c = card,
            None => self.0.push(card),
        }
        self
    }
    /// Appends a comment card
    pub fn comment<C: Into<String>>(&mut self, comment: C) -> &mut Self {
        self.0.push(Card {
            key: COMMENT.to_string(),
            value: String::new(),
            comment: comment.into(),
        });
        self
    }
    /// Returns the value of a card
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.value.as_str())
    }
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|c| c.key == COMMENT)
            .map(|c| c.comment.as_str())
    }
    pub fn cards(&self) -> &[Card] {
        &self.0
    }
    pub fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Writes the cards as `key,value,comment` CSV records
    pub fn to_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for card in &self.0 {
            wtr.serialize(card)?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
    /// Reads the cards from `key,value,comment` CSV records
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        Ok(Self(
            rdr.deserialize::<Card>()
                .collect::<std::result::Result<Vec<Card>, csv::Error>>()?,
        ))
    }
    /// Loads a header CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading {:?}...", path);
        Self::from_csv(File::open(path).map_err(|e| Error::Io(e, path.to_path_buf()))?)
    }
}
impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.0 {
            if card.key == COMMENT {
                writeln!(f, "{:<8} {}", card.key, card.comment)?;
            } else if card.comment.is_empty() {
                writeln!(f, "{:<8} = {}", card.key, card.value)?;
            } else {
                writeln!(f, "{:<8} = {} / {}", card.key, card.value, card.comment)?;
            }
        }
        Ok(())
    }
}
