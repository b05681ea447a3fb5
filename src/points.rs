use crate::error::{AttvisError, Result};
use crate::geometry::QueryPoint;

/// Parse `x1,y1.x2,y2...` into query points.
pub fn parse_points(input: &str) -> Result<Vec<QueryPoint>> {
    let invalid = |reason: String| AttvisError::InvalidPoints {
        input: input.to_string(),
        reason,
    };

    if input.trim().is_empty() {
        return Err(invalid("no points given".to_string()));
    }

    input
        .trim()
        .split('.')
        .map(|pair| {
            let coords: Vec<&str> = pair.split(',').collect();
            if coords.len() != 2 {
                return Err(invalid(format!(
                    "expected `x,y` but got {pair:?}"
                )));
            }
            let parse = |s: &str| {
                s.trim()
                    .parse::<i64>()
                    .map_err(|e| invalid(format!("bad coordinate {s:?}: {e}")))
            };
            Ok(QueryPoint::new(parse(coords[0])?, parse(coords[1])?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dot_separated_pairs() {
        let points = parse_points("11,22.44,77").unwrap();
        assert_eq!(points, vec![QueryPoint::new(11, 22), QueryPoint::new(44, 77)]);
    }

    #[test]
    fn single_point() {
        assert_eq!(parse_points("5,6").unwrap(), vec![QueryPoint::new(5, 6)]);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "11", "11,22,33", "11,22.", "a,b", "1.5,2"] {
            assert!(
                matches!(parse_points(bad), Err(AttvisError::InvalidPoints { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
