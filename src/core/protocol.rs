/// Wire protocol between the terminal client and the poker backend.
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde::de::DeserializeOwned;

/// Actions the client sends to the backend.
///
/// Serde's external tagging gives the exact wire shapes the backend expects:
/// unit variants encode as bare strings (`"Fold"`) and `Bet` as `{"Bet": 10}`.
/// Unknown tags are rejected on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Join,
    Fold,
    Check,
    Call,
    Bet(u32),
}

impl Action {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Game state pushed by the backend after every accepted action.
///
/// Only `pot` and `current_bet` are required. Cards and seats are read when
/// they have the expected shape and left empty otherwise; any other field is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableSnapshot {
    pub pot: u32,
    pub current_bet: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub community_cards: Vec<Card>,
    #[serde(default, deserialize_with = "lenient")]
    pub players: Vec<Seat>,
}

impl TableSnapshot {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Seat {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub chips: u32,
    #[serde(default)]
    pub hand: Vec<Card>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Card {
    pub suit: char,
    pub rank: Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Rank {
    Number(u8),
    Jack,
    Queen,
    King,
    Ace,
}

impl Card {
    /// Hearts and diamonds.
    pub fn is_red(&self) -> bool {
        matches!(self.suit, '♥' | '♦')
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Number(n) => write!(f, "{n}"),
            Rank::Jack => f.write_str("J"),
            Rank::Queen => f.write_str("Q"),
            Rank::King => f.write_str("K"),
            Rank::Ace => f.write_str("A"),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

// Extension fields must never fail the whole snapshot.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unrecognized snapshot extension field");
            Ok(T::default())
        }
    }
}
