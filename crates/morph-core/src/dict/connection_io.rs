use std::fs;
use std::path::Path;

use super::connection::ConnectionMatrix;
use super::DictError;

impl ConnectionMatrix {
    /// Build from a text file.
    ///
    /// Supports two formats (auto-detected):
    /// - **Dense**: Line 1 is `num_ids` (or `num_left num_right`), then one cost per line.
    /// - **MeCab** (`matrix.def`): Line 1 is `num_left num_right`, then
    ///   `right_id left_id cost` per line.
    pub fn from_text(text: &str) -> Result<Self, DictError> {
        let mut lines = text.lines().enumerate().peekable();

        let (_, header) = lines
            .next()
            .ok_or_else(|| DictError::Parse("empty file".to_string()))?;
        let parts: Vec<&str> = header.split_whitespace().collect();
        let (num_left, num_right): (u16, u16) = match parts.len() {
            1 => {
                let n = parts[0]
                    .parse()
                    .map_err(|e| DictError::Parse(format!("invalid num_ids: {e}")))?;
                (n, n)
            }
            2 => (
                parts[0]
                    .parse()
                    .map_err(|e| DictError::Parse(format!("invalid num_left: {e}")))?,
                parts[1]
                    .parse()
                    .map_err(|e| DictError::Parse(format!("invalid num_right: {e}")))?,
            ),
            _ => {
                return Err(DictError::Parse(format!(
                    "expected 1 or 2 values in header, got {}",
                    parts.len()
                )));
            }
        };

        let expected = num_left as usize * num_right as usize;

        // Auto-detect format: skip empty lines then peek at first data line
        while lines.peek().is_some_and(|(_, line)| line.trim().is_empty()) {
            lines.next();
        }
        let is_triplet = lines
            .peek()
            .is_some_and(|(_, line)| line.split_whitespace().count() == 3);

        let costs = if is_triplet {
            // Cells not listed keep cost 0.
            let mut costs = vec![0i16; expected];
            for (i, line) in lines {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let line_no = i + 1;
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() != 3 {
                    return Err(DictError::Line {
                        line: line_no,
                        reason: format!("expected 3 fields, got {}", fields.len()),
                    });
                }
                let parse_field = |idx: usize, name: &str| -> Result<i64, DictError> {
                    fields[idx].parse().map_err(|e| DictError::Line {
                        line: line_no,
                        reason: format!("{name}: {e}"),
                    })
                };
                let right_id = parse_field(0, "right_id")?;
                let left_id = parse_field(1, "left_id")?;
                let cost = parse_field(2, "cost")?;
                if !(0..num_left as i64).contains(&right_id)
                    || !(0..num_right as i64).contains(&left_id)
                {
                    return Err(DictError::Line {
                        line: line_no,
                        reason: format!("index out of bounds: ({right_id}, {left_id})"),
                    });
                }
                let cost = i16::try_from(cost).map_err(|_| DictError::Line {
                    line: line_no,
                    reason: format!("cost {cost} does not fit in i16"),
                })?;
                costs[right_id as usize * num_right as usize + left_id as usize] = cost;
            }
            costs
        } else {
            let mut costs = Vec::with_capacity(expected);
            for (_, line) in lines {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let cost: i16 = line
                    .parse()
                    .map_err(|e| DictError::Parse(format!("invalid cost '{line}': {e}")))?;
                costs.push(cost);
            }
            if costs.len() != expected {
                return Err(DictError::Parse(format!(
                    "expected {expected} costs, got {}",
                    costs.len()
                )));
            }
            costs
        };

        Ok(Self {
            num_left,
            num_right,
            costs,
        })
    }

    pub fn open_text(path: &Path) -> Result<Self, DictError> {
        Self::from_text(&fs::read_to_string(path)?)
    }
}
