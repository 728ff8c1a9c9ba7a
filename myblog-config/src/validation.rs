use myblog_core::storage::StorageDriver;
use url::Url;

use crate::models::Config;

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(&mut self, message: S, hint: H) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Reject configurations that cannot start, and flag optional features that
/// are switched off by missing secrets.
pub fn check(config: &Config) -> Result<ConfigWarnings, String> {
    let mut warnings = ConfigWarnings::default();

    Url::parse(&config.server.base_url)
        .map_err(|err| format!("base-url {:?} is not a valid URL: {err}", config.server.base_url))?;

    match config.storage.driver {
        StorageDriver::AmazonS3 => {
            let s3 = &config.storage.amazon_s3;
            if s3.access_key.is_none() || s3.secret_key.is_none() {
                return Err(
                    "storage driver s3 requires amazon-s3-access-key and amazon-s3-secret-key"
                        .to_string(),
                );
            }
        }
        StorageDriver::GoogleCloud => match &config.storage.gcloud.credentials_file_path {
            None => {
                return Err(
                    "storage driver gcloud requires gcloud-credentials-file-path".to_string(),
                );
            }
            Some(path) if !path.exists() => {
                return Err(format!(
                    "gcloud credentials file {} does not exist",
                    path.display()
                ));
            }
            Some(_) => {}
        },
        StorageDriver::LocalDisk => {}
    }

    if config.facebook.app_access_token.is_none() {
        warnings.push_with_hint(
            "Facebook app access token not set; post engagement counts will be zero",
            "Set FACEBOOK_APP_ACCESS_TOKEN to enable share counts",
        );
    }

    Ok(warnings)
}
