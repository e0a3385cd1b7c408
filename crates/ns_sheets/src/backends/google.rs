//! Google Sheets backend over the public REST APIs.
//!
//! Authentication uses the service-account JWT bearer flow. The spreadsheet
//! is located by title through Drive, then addressed through the Sheets v4
//! `values` endpoints.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use ns_core::{Error, Result, Worksheet};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use crate::credentials::ServiceAccountKey;

pub const SCOPES: &str = "https://spreadsheets.google.com/feeds https://www.googleapis.com/auth/drive";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl JwtClaims {
    fn new(key: &ServiceAccountKey, issued_at: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: SCOPES.to_string(),
            aud: key.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        }
    }
}

fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| Error::Auth(format!("Invalid private key: {}", e)))?;
    jsonwebtoken::encode(&header, &JwtClaims::new(key, issued_at), &encoding_key)
        .map_err(|e| Error::Auth(format!("Failed to sign token request: {}", e)))
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: i64,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Converts a 1-based column index to its A1 letters (1 -> A, 27 -> AA).
pub fn column_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Prefixes an A1 range with the quoted sheet title.
pub fn a1_range(sheet: &str, range: &str) -> String {
    let quoted = format!("'{}'", sheet.replace('\'', "''"));
    if range.is_empty() {
        quoted
    } else {
        format!("{}!{}", quoted, range)
    }
}

fn drive_title_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

fn values_url(spreadsheet_id: &str, range: &str, suffix: &str) -> Result<Url> {
    let mut url = Url::parse(SHEETS_API)
        .map_err(|e| Error::Config(format!("Invalid Sheets endpoint: {}", e)))?;
    let target = format!("{}{}", range, suffix);
    url.path_segments_mut()
        .map_err(|_| Error::Config("Sheets endpoint cannot be a base".to_string()))?
        .extend([spreadsheet_id, "values", target.as_str()]);
    Ok(url)
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

async fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let reason = match status {
        StatusCode::NOT_FOUND => "not found",
        StatusCode::FORBIDDEN => "permission denied",
        StatusCode::UNAUTHORIZED => "unauthorized",
        _ => "request failed",
    };
    Err(Error::Access(format!(
        "{}: {} ({}) {}",
        context,
        reason,
        status,
        body.trim()
    )))
}

/// Authenticated handle to the Sheets and Drive APIs.
pub struct GoogleSheetsClient {
    http: Client,
    token: String,
}

impl GoogleSheetsClient {
    pub fn with_token(http: Client, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
        }
    }

    /// Exchanges a signed service-account assertion for an access token.
    pub async fn authorize(key: &ServiceAccountKey) -> Result<Self> {
        let http = Client::new();
        let assertion = sign_assertion(key, Utc::now().timestamp())?;

        let response = http
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "Token request rejected ({}): {}",
                status,
                body.trim()
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("Malformed token response: {}", e)))?;
        debug!("Obtained access token for {}", key.client_email);

        Ok(Self::with_token(http, token.access_token))
    }

    /// Opens the first worksheet of the spreadsheet with this exact title.
    pub async fn open(&self, title: &str) -> Result<GoogleWorksheet> {
        let spreadsheet_id = self.find_spreadsheet_id(title).await?;
        let sheet_title = self.first_sheet_title(&spreadsheet_id).await?;
        debug!(
            "Opened spreadsheet {} ({}), worksheet {}",
            title, spreadsheet_id, sheet_title
        );
        Ok(GoogleWorksheet {
            http: self.http.clone(),
            token: self.token.clone(),
            spreadsheet_id,
            title: sheet_title,
        })
    }

    async fn find_spreadsheet_id(&self, title: &str) -> Result<String> {
        let query = drive_title_query(title);
        let response = self
            .http
            .get(DRIVE_FILES_API)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "10"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let list: DriveFileList = ensure_success(response, "Spreadsheet lookup")
            .await?
            .json()
            .await?;

        list.files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| Error::Access(format!("Spreadsheet not found: {}", title)))
    }

    async fn first_sheet_title(&self, spreadsheet_id: &str) -> Result<String> {
        let response = self
            .http
            .get(format!("{}/{}", SHEETS_API, spreadsheet_id))
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(title,index)")])
            .send()
            .await?;
        let metadata: SpreadsheetMetadata = ensure_success(response, "Spreadsheet metadata")
            .await?
            .json()
            .await?;

        metadata
            .sheets
            .into_iter()
            .min_by_key(|s| s.properties.index)
            .map(|s| s.properties.title)
            .ok_or_else(|| Error::Access(format!("Spreadsheet {} has no worksheets", spreadsheet_id)))
    }
}

/// The first worksheet of a remote spreadsheet.
pub struct GoogleWorksheet {
    http: Client,
    token: String,
    spreadsheet_id: String,
    title: String,
}

impl GoogleWorksheet {
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn get_values(&self, range: &str, major_dimension: &str) -> Result<Vec<Vec<String>>> {
        let url = values_url(&self.spreadsheet_id, &a1_range(&self.title, range), "")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("majorDimension", major_dimension)])
            .send()
            .await?;
        let range: ValueRange = ensure_success(response, "Read values")
            .await?
            .json()
            .await?;
        Ok(range
            .values
            .iter()
            .map(|line| line.iter().map(cell_to_string).collect())
            .collect())
    }
}

#[async_trait]
impl Worksheet for GoogleWorksheet {
    fn title(&self) -> &str {
        &self.title
    }

    async fn col_values(&self, col: usize) -> Result<Vec<String>> {
        let letter = column_letter(col);
        let range = format!("{}:{}", letter, letter);
        let columns = self.get_values(&range, "COLUMNS").await?;
        Ok(columns.into_iter().next().unwrap_or_default())
    }

    async fn row_values(&self, row: usize) -> Result<Vec<String>> {
        let range = format!("{}:{}", row, row);
        let rows = self.get_values(&range, "ROWS").await?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    async fn append_row(&self, values: &[String]) -> Result<()> {
        let url = values_url(&self.spreadsheet_id, &a1_range(&self.title, ""), ":append")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": [values] }))
            .send()
            .await?;
        ensure_success(response, "Append row").await?;
        Ok(())
    }
}
