use crate::{ErrorCode, ErrorContext, HomeSalesError};
use datafusion::error::DataFusionError;

impl From<DataFusionError> for HomeSalesError {
    fn from(err: DataFusionError) -> Self {
        // Context wrappers hide the error we actually want to classify
        match err.find_root() {
            DataFusionError::SchemaError(schema_err, _) => match schema_err.as_ref() {
                datafusion::common::SchemaError::FieldNotFound {
                    field,
                    valid_fields,
                } => {
                    let available: Vec<String> =
                        valid_fields.iter().map(|f| f.name.clone()).collect();

                    let hint = find_closest_match(&field.name, &available);

                    let mut error = HomeSalesError::new(
                        ErrorCode::FieldNotFound,
                        format!("Field '{}' not found", field.name),
                    )
                    .with_context(ErrorContext::FieldNotFound {
                        field: field.name.clone(),
                        view: field.relation.as_ref().map(|r| r.table().to_string()),
                        available_fields: available,
                    });

                    if let Some(closest) = hint {
                        error = error.with_hint(format!("Did you mean '{}'?", closest));
                    }
                    error
                }
                _ => HomeSalesError::new(ErrorCode::EngineInternal, schema_err.to_string()),
            },
            DataFusionError::Plan(msg) if is_missing_table(msg) => {
                HomeSalesError::new(ErrorCode::ViewNotFound, msg.clone())
                    .with_hint("Register the dataset as a view before querying it")
            }
            DataFusionError::Plan(msg) => HomeSalesError::new(ErrorCode::SyntaxError, msg.clone()),
            DataFusionError::SQL(parse_err, _) => {
                HomeSalesError::new(ErrorCode::SyntaxError, parse_err.to_string())
            }
            DataFusionError::IoError(io_err) => io_error(io_err),
            DataFusionError::ObjectStore(store_err) => {
                HomeSalesError::new(ErrorCode::DatasetUnreadable, store_err.to_string())
            }
            root => HomeSalesError::new(ErrorCode::EngineInternal, root.to_string()),
        }
    }
}

impl From<std::io::Error> for HomeSalesError {
    fn from(err: std::io::Error) -> Self {
        io_error(&err)
    }
}

impl From<serde_json::Error> for HomeSalesError {
    fn from(err: serde_json::Error) -> Self {
        HomeSalesError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<serde_yaml::Error> for HomeSalesError {
    fn from(err: serde_yaml::Error) -> Self {
        HomeSalesError::new(ErrorCode::InvalidConfig, err.to_string())
    }
}

impl HomeSalesError {
    /// Classify an I/O error raised while writing or managing output.
    ///
    /// The plain `From<std::io::Error>` conversion assumes the error came from
    /// reading the dataset.
    pub fn storage_io(err: &std::io::Error) -> Self {
        HomeSalesError::new(ErrorCode::WriteFailed, err.to_string())
    }
}

// Reads are the default: writes go through `storage_io` or `WriteFailed` directly
fn io_error(err: &std::io::Error) -> HomeSalesError {
    match err.kind() {
        std::io::ErrorKind::NotFound => {
            HomeSalesError::new(ErrorCode::DatasetNotFound, err.to_string())
        }
        _ => HomeSalesError::new(ErrorCode::DatasetUnreadable, err.to_string()),
    }
}

// DataFusion reports unknown tables as "table '<catalog>.<schema>.<name>' not found"
fn is_missing_table(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.starts_with("table '") && lower.ends_with("not found")
}

pub(crate) fn find_closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0; b.len() + 1]; a.len() + 1];

    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate() {
        *val = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            dp[i][j] = std::cmp::min(
                std::cmp::min(dp[i - 1][j] + 1, dp[i][j - 1] + 1),
                dp[i - 1][j - 1] + cost,
            );
        }
    }

    dp[a.len()][b.len()]
}
