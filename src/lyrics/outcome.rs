use super::{downloader::DownloadError, types::LyricPayload};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(LyricPayload),
    NotFound,
    Failure(String),
}

/// Maps a downloader result to exactly one outcome.
///
/// `NotFound` is only produced by the downloader's explicit signal. A missing
/// or empty payload is a failure, as is every other error.
pub fn classify(result: Result<Option<LyricPayload>, DownloadError>) -> Outcome {
    match result {
        Ok(Some(payload)) if !payload.is_empty() => Outcome::Success(payload),
        Ok(Some(_)) => Outcome::Failure("downloader returned an empty lyric".to_string()),
        Ok(None) => Outcome::Failure("downloader returned no lyric data".to_string()),
        Err(DownloadError::NotFound) => Outcome::NotFound,
        Err(e) => Outcome::Failure(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_success() {
        let payload = LyricPayload::new("[00:01.00]hello");
        assert_eq!(
            classify(Ok(Some(payload.clone()))),
            Outcome::Success(payload)
        );
    }

    #[test]
    fn test_not_found_signal() {
        assert_eq!(classify(Err(DownloadError::NotFound)), Outcome::NotFound);
    }

    #[test]
    fn test_absent_payload_is_failure_not_not_found() {
        assert!(matches!(classify(Ok(None)), Outcome::Failure(_)));
        assert!(matches!(
            classify(Ok(Some(LyricPayload::default()))),
            Outcome::Failure(_)
        ));
    }

    #[test]
    fn test_other_errors_are_failures() {
        let outcome = classify(Err(DownloadError::Other(anyhow::anyhow!("parse error"))));
        assert_eq!(outcome, Outcome::Failure("parse error".to_string()));

        let outcome = classify(Err(DownloadError::Status(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        )));
        assert!(matches!(outcome, Outcome::Failure(reason) if reason.contains("500")));
    }
}
