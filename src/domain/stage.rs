//! Loaded stage content

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{LevelError, Result};

/// Concrete content of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePayload {
    pub stage_id: String,

    #[serde(default)]
    pub levels: Vec<LevelRecord>,
}

impl StagePayload {
    /// Parse a stage file
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| LevelError::deserialize("stage", e))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LevelError::serialize("stage", e))
    }

    /// Level at a zero-based position within the stage
    pub fn get(&self, index: usize) -> Option<&LevelRecord> {
        self.levels.get(index)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// Gameplay category of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelKind {
    Normal,
    Mystery,
    Hard,
    Special,
    Other(i32),
}

/// One puzzle. Opaque to resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    #[serde(default)]
    pub level_type: i32,

    #[serde(deserialize_with = "puzzle_id_from_any")]
    pub puzzle_id: String,

    #[serde(default)]
    pub tubes: Vec<Vec<i32>>,

    #[serde(default)]
    pub steps: Vec<Vec<i32>>,
}

impl LevelRecord {
    pub fn kind(&self) -> LevelKind {
        match self.level_type {
            0 => LevelKind::Normal,
            1 => LevelKind::Mystery,
            2 => LevelKind::Hard,
            3 => LevelKind::Special,
            n => LevelKind::Other(n),
        }
    }

    /// Number of tube cells, skipping rows whose first cell is empty
    pub fn tube_count(&self) -> usize {
        self.tubes
            .iter()
            .filter(|row| row.first().is_some_and(|&c| c != 0))
            .map(|row| row.len())
            .sum()
    }
}

/// Older stage files store `puzzle_id` as a number
fn puzzle_id_from_any<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PuzzleId {
        Text(String),
        Int(i64),
    }

    Ok(match PuzzleId::deserialize(deserializer)? {
        PuzzleId::Text(s) => s,
        PuzzleId::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_puzzle_id_accepts_string_or_number() {
        let json = r#"{"stage_id": "s1", "levels": [
            {"level_type": 2, "puzzle_id": "p-9", "tubes": [[1,2],[0,0]], "steps": [[0,1]]},
            {"puzzle_id": 77}
        ]}"#;
        let stage = StagePayload::from_json(json.as_bytes()).unwrap();

        assert_eq!(stage.levels[0].puzzle_id, "p-9");
        assert_eq!(stage.levels[0].kind(), LevelKind::Hard);
        assert_eq!(stage.levels[1].puzzle_id, "77");
        assert_eq!(stage.levels[1].kind(), LevelKind::Normal);
        assert!(stage.levels[1].tubes.is_empty());
    }

    #[test]
    fn test_tube_count_skips_empty_rows() {
        let level = LevelRecord {
            level_type: 0,
            puzzle_id: "x".to_string(),
            tubes: vec![vec![1, 2, 3], vec![0, 4], vec![5], vec![]],
            steps: vec![],
        };
        assert_eq!(level.tube_count(), 4);
    }

    #[test]
    fn test_out_of_range_index_is_none() {
        let stage = StagePayload {
            stage_id: "s".to_string(),
            levels: vec![],
        };
        assert!(stage.get(0).is_none());
    }
}
