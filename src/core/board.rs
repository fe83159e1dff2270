use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub name: String,
    pub identifier: String,
}

impl BoardRecord {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }

    /// `needle` must already be lowercased.
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.identifier.to_lowercase().contains(needle)
    }
}

/// Parses `board listall` output. The first line is the column header and is
/// always dropped; the last column of every other line is the identifier.
pub fn parse_board_listing(output: &str) -> Vec<BoardRecord> {
    let mut boards = Vec::new();

    for line in output.lines().skip(1) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((identifier, name)) = tokens.split_last() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        boards.push(BoardRecord::new(name.join(" "), *identifier));
    }

    boards
}

pub fn filter_boards<'a>(boards: &'a [BoardRecord], query: &str) -> Vec<&'a BoardRecord> {
    let needle = query.to_lowercase();
    boards
        .iter()
        .filter(|board| board.matches_lowercase(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "Board Name                 FQBN\n\
Arduino Uno                arduino:avr:uno\n\
Arduino Mega or Mega 2560  arduino:avr:mega\n";

    fn sample() -> Vec<BoardRecord> {
        vec![
            BoardRecord::new("Arduino Uno", "arduino:avr:uno"),
            BoardRecord::new("Arduino Mega or Mega 2560", "arduino:avr:mega"),
            BoardRecord::new("ESP32 Dev Module", "esp32:esp32:esp32"),
        ]
    }

    #[test]
    fn parses_name_and_identifier_columns() {
        let boards = parse_board_listing(LISTING);
        assert_eq!(
            boards,
            vec![
                BoardRecord::new("Arduino Uno", "arduino:avr:uno"),
                BoardRecord::new("Arduino Mega or Mega 2560", "arduino:avr:mega"),
            ]
        );
    }

    #[test]
    fn collapses_whitespace_runs_in_names() {
        let boards = parse_board_listing(
            "Board Name FQBN\nAdafruit\tCircuit   Playground  adafruit:avr:circuitplay32u4cat\n",
        );
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].name, "Adafruit Circuit Playground");
        assert_eq!(boards[0].identifier, "adafruit:avr:circuitplay32u4cat");
    }

    #[test]
    fn skips_short_and_blank_lines() {
        let output = "Board Name FQBN\n\nlonely\nArduino Nano arduino:avr:nano\n   \n";
        let boards = parse_board_listing(output);
        assert_eq!(boards, vec![BoardRecord::new("Arduino Nano", "arduino:avr:nano")]);
    }

    #[test]
    fn identifier_without_name_is_skipped() {
        let output = "Board Name FQBN\narduino:avr:uno\nArduino Uno arduino:avr:uno\n";
        let boards = parse_board_listing(output);
        assert_eq!(boards, vec![BoardRecord::new("Arduino Uno", "arduino:avr:uno")]);
    }

    #[test]
    fn header_only_output_yields_nothing() {
        assert!(parse_board_listing("Board Name FQBN\n").is_empty());
        assert!(parse_board_listing("").is_empty());
    }

    #[test]
    fn search_is_case_insensitive_on_both_fields() {
        let boards = sample();
        let by_name = filter_boards(&boards, "uno");
        assert_eq!(by_name, vec![&boards[0]]);

        let by_identifier = filter_boards(&boards, "AVR");
        assert_eq!(by_identifier, vec![&boards[0], &boards[1]]);
    }

    #[test]
    fn empty_query_keeps_catalog_order() {
        let boards = sample();
        let all = filter_boards(&boards, "");
        assert_eq!(all, boards.iter().collect::<Vec<_>>());
    }

    #[test]
    fn no_match_is_empty() {
        assert!(filter_boards(&sample(), "teensy").is_empty());
    }
}
