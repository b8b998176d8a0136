use std::collections::HashMap;
use std::time::Duration;

use chatify_load_core::config::{DEFAULT_TARGET_PROFILE, LoadGenAppConfig};
use chatify_load_core::{LoadGenError, Result, bail_config, ensure_config};
use url::Url;

use crate::application::IterationPolicy;
use crate::domain::model::PhraseCorpus;
use crate::domain::service::payload_synthesizer::{DEFAULT_TO_USER_ID, DEFAULT_TTL_SECONDS};

const DEFAULT_PATH: &str = "/chatify/logic/v1/sendSystemPush";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// 校验后的推送压测配置
///
/// 所有致命的配置错误都在这里产生，压测开始后不会再出现
#[derive(Debug, Clone)]
pub struct PushLoadTestConfig {
    /// 完整的请求地址
    pub endpoint: Url,
    pub headers: HashMap<String, String>,
    pub request_timeout: Duration,
    pub expected_status: u16,
    pub to_user_ids: Vec<String>,
    pub ttl_seconds: i64,
    pub corpus: PhraseCorpus,
    pub virtual_users: usize,
    pub policy: IterationPolicy,
    pub think_time: Option<Duration>,
    pub seed: Option<u64>,
}

impl PushLoadTestConfig {
    pub fn from_app_config(app: &LoadGenAppConfig) -> Result<Self> {
        let service = app.push_loadtest_service();

        let target_name = service.target.as_deref().unwrap_or(DEFAULT_TARGET_PROFILE);
        let target = app.target_profile(target_name);
        if service.target_url.is_none() && target.is_none() {
            bail_config!("unknown target profile '{}'", target_name);
        }

        let base_url = service
            .target_url
            .clone()
            .or_else(|| target.map(|t| t.base_url.clone()))
            .unwrap_or_default();
        let path = service
            .path
            .clone()
            .or_else(|| target.and_then(|t| t.path.clone()))
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        let endpoint = build_endpoint(&base_url, &path)?;

        let timeout_ms = service
            .request_timeout_ms
            .or_else(|| target.and_then(|t| t.timeout_ms))
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        ensure_config!(timeout_ms > 0, "request timeout must be positive");

        let corpus = match service.phrases.clone() {
            Some(phrases) => PhraseCorpus::new(phrases)?,
            None => PhraseCorpus::builtin(),
        };

        let to_user_ids = service
            .to_user_ids
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_TO_USER_ID.to_string()]);
        ensure_config!(!to_user_ids.is_empty(), "to_user_ids must not be empty");

        let ttl_seconds = service.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        ensure_config!(
            ttl_seconds > 0,
            "ttl_seconds must be positive, got {}",
            ttl_seconds
        );

        let virtual_users = service.virtual_users.unwrap_or(1);
        ensure_config!(virtual_users > 0, "virtual_users must be at least 1");

        let policy = match (service.duration_secs, service.iterations) {
            (Some(0), _) => bail_config!("duration_secs must be positive"),
            (Some(secs), _) => IterationPolicy::Duration(Duration::from_secs(secs)),
            (None, Some(0)) => bail_config!("iterations must be at least 1"),
            (None, Some(n)) => IterationPolicy::Iterations(n),
            (None, None) => IterationPolicy::Iterations(1),
        };

        Ok(Self {
            endpoint,
            headers: target.map(|t| t.headers.clone()).unwrap_or_default(),
            request_timeout: Duration::from_millis(timeout_ms),
            expected_status: service.expected_status.unwrap_or(DEFAULT_EXPECTED_STATUS),
            to_user_ids,
            ttl_seconds,
            corpus,
            virtual_users,
            policy,
            think_time: service
                .think_time_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            seed: service.seed,
        })
    }
}

fn build_endpoint(base_url: &str, path: &str) -> Result<Url> {
    let base = Url::parse(base_url.trim())
        .map_err(|err| LoadGenError::Config(format!("malformed target url '{}': {}", base_url, err)))?;
    ensure_config!(
        matches!(base.scheme(), "http" | "https"),
        "target url '{}' must use http or https",
        base_url
    );
    ensure_config!(base.has_host(), "target url '{}' has no host", base_url);

    base.join(path)
        .map_err(|err| LoadGenError::Config(format!("invalid endpoint path '{}': {}", path, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatify_load_core::config::{PushLoadTestServiceConfig, TargetEndpointConfig};

    fn app_with(service: PushLoadTestServiceConfig) -> LoadGenAppConfig {
        let mut app = LoadGenAppConfig::default();
        app.targets.insert(
            DEFAULT_TARGET_PROFILE.to_string(),
            TargetEndpointConfig {
                base_url: "http://localhost:8034".to_string(),
                path: None,
                timeout_ms: Some(1_500),
                headers: HashMap::from([("x-load-test".to_string(), "1".to_string())]),
            },
        );
        app.services.push_loadtest = Some(service);
        app
    }

    #[test]
    fn test_defaults_target_local_system_push() {
        let config = PushLoadTestConfig::from_app_config(&app_with(Default::default())).unwrap();

        assert_eq!(
            config.endpoint.as_str(),
            "http://localhost:8034/chatify/logic/v1/sendSystemPush"
        );
        assert_eq!(config.to_user_ids, vec!["uidhSSWsdYgB9".to_string()]);
        assert_eq!(config.ttl_seconds, 86_400);
        assert_eq!(config.expected_status, 200);
        assert_eq!(config.request_timeout, Duration::from_millis(1_500));
        assert_eq!(config.virtual_users, 1);
        assert_eq!(config.policy, IterationPolicy::Iterations(1));
        assert_eq!(config.corpus.len(), 15);
        assert_eq!(config.headers.get("x-load-test").map(String::as_str), Some("1"));
        assert!(config.think_time.is_none());
    }

    #[test]
    fn test_duration_wins_over_iterations() {
        let config = PushLoadTestConfig::from_app_config(&app_with(PushLoadTestServiceConfig {
            iterations: Some(10),
            duration_secs: Some(30),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(
            config.policy,
            IterationPolicy::Duration(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_target_url_override() {
        let config = PushLoadTestConfig::from_app_config(&app_with(PushLoadTestServiceConfig {
            target_url: Some("https://push.example.com/".to_string()),
            path: Some("/v2/push".to_string()),
            ..Default::default()
        }))
        .unwrap();
        assert_eq!(config.endpoint.as_str(), "https://push.example.com/v2/push");
    }

    #[test]
    fn test_fatal_configuration_errors() {
        let cases = [
            PushLoadTestServiceConfig {
                phrases: Some(vec![]),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                to_user_ids: Some(vec![]),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                target_url: Some("not a url".to_string()),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                target_url: Some("ftp://files.example.com".to_string()),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                virtual_users: Some(0),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                ttl_seconds: Some(0),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                iterations: Some(0),
                ..Default::default()
            },
            PushLoadTestServiceConfig {
                target: Some("nowhere".to_string()),
                ..Default::default()
            },
        ];

        for service in cases {
            let err = PushLoadTestConfig::from_app_config(&app_with(service.clone()))
                .expect_err(&format!("{:?} should be rejected", service));
            assert!(
                matches!(err, LoadGenError::Config(_) | LoadGenError::Generation(_)),
                "{err}"
            );
        }
    }
}
