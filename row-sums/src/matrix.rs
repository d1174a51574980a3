use std::str::FromStr;
use thiserror::Error;

/// One cell of the input grid: the value to add and how long to take doing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub value: i64,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    fields: Vec<Field>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("input ended early: expected {0}")]
    Missing(&'static str),
    #[error("'{token}' is not a valid {what}")]
    Malformed { token: String, what: &'static str },
}

impl Matrix {
    pub fn new(rows: usize, columns: usize, fields: Vec<Field>) -> Matrix {
        assert_eq!(fields.len(), rows * columns, "grid size does not match its dimensions");
        Matrix {
            rows,
            columns,
            fields,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn field(&self, row: usize, column: usize) -> Field {
        self.fields[row * self.columns + column]
    }

    /// Parse `k n` followed by `k * n` pairs `v t`, row by row. Tokens may be split by any whitespace.
    pub fn parse(input: &str) -> Result<Matrix, InputError> {
        let mut tokens = input.split_whitespace();
        let rows: usize = next_token(&mut tokens, "number of rows")?;
        let columns: usize = next_token(&mut tokens, "number of columns")?;
        let mut fields = Vec::with_capacity(rows.saturating_mul(columns).min(1 << 16));
        for _ in 0..rows.saturating_mul(columns) {
            let value = next_token(&mut tokens, "value")?;
            let delay_ms = next_token(&mut tokens, "delay")?;
            fields.push(Field { value, delay_ms });
        }
        Ok(Matrix::new(rows, columns, fields))
    }
}

fn next_token<'a, T, I>(tokens: &mut I, what: &'static str) -> Result<T, InputError>
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    let token = tokens.next().ok_or(InputError::Missing(what))?;
    token.parse::<T>().map_err(|_| InputError::Malformed {
        token: token.to_string(),
        what,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_row_major_grid() {
        let matrix = Matrix::parse("2\n3\n1 2\n1 5\n12 4\n23 9\n3 11\n7 2\n").unwrap();
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.columns(), 3);
        assert_eq!(
            matrix.field(0, 2),
            Field {
                value: 12,
                delay_ms: 4
            }
        );
        assert_eq!(matrix.field(1, 0).value, 23);
    }

    #[test]
    fn reports_short_and_malformed_input() {
        assert_eq!(
            Matrix::parse("1 2 5 0"),
            Err(InputError::Missing("value"))
        );
        assert_eq!(
            Matrix::parse("1 x"),
            Err(InputError::Malformed {
                token: "x".to_string(),
                what: "number of columns"
            })
        );
    }

    #[test]
    fn empty_dimensions_need_no_fields() {
        let matrix = Matrix::parse("3 0").unwrap();
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.columns(), 0);
    }
}
