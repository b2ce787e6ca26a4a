// Structured API payload extraction.
//
// The endpoint answers `{"returnValue": "success", "drwNo": 1206, "drwtNo1": 1, ...}`
// for drawn rounds and `{"returnValue": "fail"}` for rounds that do not exist yet.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::draw::DrawRecord;
use crate::error::ExtractError;

pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LottoNumberPayload {
    pub return_value: Option<String>,
    drw_no: Option<i64>,
    drwt_no1: Option<i64>,
    drwt_no2: Option<i64>,
    drwt_no3: Option<i64>,
    drwt_no4: Option<i64>,
    drwt_no5: Option<i64>,
    drwt_no6: Option<i64>,
    bnus_no: Option<i64>,
    drw_no_date: Option<String>,
}

impl LottoNumberPayload {
    pub(crate) fn parse(body: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(body).map_err(|e| ExtractError::Malformed(e.to_string()))
    }

    pub(crate) fn is_success(&self) -> bool {
        self.return_value.as_deref() == Some(SUCCESS_STATUS)
    }
}

/// Extracts a record from an API body. Succeeds only on a `success` status
/// with every field present.
pub fn extract_api_record(body: &str) -> Result<DrawRecord, ExtractError> {
    let payload = LottoNumberPayload::parse(body)?;
    if !payload.is_success() {
        return Err(ExtractError::BadStatus(payload.return_value));
    }

    let round = payload.drw_no.ok_or(ExtractError::MissingField("drwNo"))?;
    let numbers = [
        payload.drwt_no1.ok_or(ExtractError::MissingField("drwtNo1"))?,
        payload.drwt_no2.ok_or(ExtractError::MissingField("drwtNo2"))?,
        payload.drwt_no3.ok_or(ExtractError::MissingField("drwtNo3"))?,
        payload.drwt_no4.ok_or(ExtractError::MissingField("drwtNo4"))?,
        payload.drwt_no5.ok_or(ExtractError::MissingField("drwtNo5"))?,
        payload.drwt_no6.ok_or(ExtractError::MissingField("drwtNo6"))?,
    ];
    let bonus = payload.bnus_no.ok_or(ExtractError::MissingField("bnusNo"))?;
    let raw_date = payload
        .drw_no_date
        .ok_or(ExtractError::MissingField("drwNoDate"))?;
    let date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
        .map_err(|_| ExtractError::InvalidDate(raw_date.clone()))?;

    DrawRecord::new(round, &numbers, Some(bonus), date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::Bonus;

    const ROUND_1206: &str = r#"{
        "totSellamnt": 118628811000,
        "returnValue": "success",
        "drwNoDate": "2026-01-10",
        "firstWinamnt": 2106656000,
        "drwtNo6": 42,
        "drwtNo4": 26,
        "firstPrzwnerCo": 13,
        "drwtNo5": 27,
        "bnusNo": 23,
        "firstAccumamnt": 27386528000,
        "drwNo": 1206,
        "drwtNo2": 3,
        "drwtNo3": 17,
        "drwtNo1": 1
    }"#;

    #[test]
    fn extracts_a_complete_payload() {
        let record = extract_api_record(ROUND_1206).unwrap();
        assert_eq!(record.round(), 1206);
        assert_eq!(record.numbers(), &[1, 3, 17, 26, 27, 42]);
        assert_eq!(record.bonus(), Bonus::Known(23));
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
    }

    #[test]
    fn fail_status_is_rejected() {
        let err = extract_api_record(r#"{"returnValue":"fail"}"#).unwrap_err();
        assert_eq!(err, ExtractError::BadStatus(Some("fail".to_string())));
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let body = ROUND_1206.replace(r#""drwtNo5": 27,"#, "");
        assert_eq!(
            extract_api_record(&body).unwrap_err(),
            ExtractError::MissingField("drwtNo5")
        );
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            extract_api_record("<html>maintenance</html>"),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn bad_date_is_rejected() {
        let body = ROUND_1206.replace("2026-01-10", "10/01/2026");
        assert!(matches!(
            extract_api_record(&body),
            Err(ExtractError::InvalidDate(_))
        ));
    }
}
