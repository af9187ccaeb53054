//! Region-bound AWS service clients
//!
//! Operations are invoked by name with JSON parameters keyed by the
//! model's member names. Requests are signed with SigV4 and sent with
//! `reqwest`; the wire format follows the service model's protocol.

mod credentials;
mod error;
mod protocol;
mod signer;

pub use credentials::CredentialsCache;
pub use error::ClientError;

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use http::header::{ACCEPT, CONTENT_TYPE, HOST};
use reqwest::Client;
use serde_json::{json, Map, Value};
use service_model::{ServiceMetadata, ServiceModel};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

use crate::accessor::{RegionalClients, SharedAccessor};
use signer::SigningScope;

/// A live client bound to one service and region
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Region the client sends requests to
    fn region(&self) -> &str;

    /// Invoke an operation by its catalog name (e.g. "ListTagsForResource")
    ///
    /// The result carries the operation output plus `ResponseMetadata`.
    async fn call(&self, operation: &str, params: Map<String, Value>) -> Result<Value, ClientError>;
}

/// Client settings shared by every service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Named profile for the default credential chain
    pub profile: Option<String>,
    /// Endpoint used for every service without its own override
    pub endpoint_url: Option<String>,
    /// Per-service endpoint overrides, keyed by lowercase service id ("sqs")
    pub service_endpoints: HashMap<String, String>,
    /// HTTP request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            profile: None,
            endpoint_url: None,
            service_endpoints: HashMap::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Read endpoint overrides from `AWS_ENDPOINT_URL` and `AWS_ENDPOINT_URL_<SERVICE>`
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut config = Self::default();
        for (name, value) in vars {
            if value.is_empty() {
                continue;
            }
            if name == "AWS_ENDPOINT_URL" {
                config.endpoint_url = Some(value);
            } else if let Some(service) = name.strip_prefix("AWS_ENDPOINT_URL_") {
                config
                    .service_endpoints
                    .insert(service.to_lowercase().replace('_', " "), value);
            }
        }
        config
    }

    /// Endpoint URL for a service in a region
    pub fn endpoint(&self, metadata: &ServiceMetadata, region: &str) -> String {
        let service_key = metadata.service_id.to_lowercase();
        if let Some(url) = self
            .service_endpoints
            .get(&service_key)
            .or(self.endpoint_url.as_ref())
        {
            return url.clone();
        }

        let suffix = if region.starts_with("cn-") {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        };
        format!("https://{}.{}.{}", metadata.endpoint_prefix, region, suffix)
    }
}

/// Signed HTTP client for one service in one region
pub struct AwsServiceClient {
    model: Arc<ServiceModel>,
    region: String,
    endpoint: url::Url,
    host: String,
    http: Client,
    credentials: Arc<CredentialsCache>,
}

impl AwsServiceClient {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl ServiceClient for AwsServiceClient {
    fn region(&self) -> &str {
        &self.region
    }

    async fn call(&self, operation: &str, params: Map<String, Value>) -> Result<Value, ClientError> {
        let op = self
            .model
            .operation(operation)
            .ok_or_else(|| ClientError::UnknownOperation(operation.to_string()))?;

        let request = protocol::encode_request(&self.model, op, &params);
        let credentials = self.credentials.get().await?;

        let mut headers: Vec<(&str, String)> = vec![
            (HOST.as_str(), self.host.clone()),
            (CONTENT_TYPE.as_str(), request.content_type.clone()),
        ];
        if let Some(target) = &request.target {
            headers.push(("x-amz-target", target.clone()));
        }
        if let Some(accept) = request.accept {
            headers.push((ACCEPT.as_str(), accept.to_string()));
        }

        let signature = signer::signature_headers(
            "POST",
            self.endpoint.as_str(),
            &headers,
            request.body.as_bytes(),
            credentials,
            SigningScope {
                region: &self.region,
                signing_name: &self.model.metadata.signing_name,
                time: SystemTime::now(),
            },
        )?;

        debug!(
            "{} {} -> {}",
            self.model.metadata.service_id, operation, self.endpoint
        );

        let mut builder = self.http.post(self.endpoint.clone()).body(request.body);
        for (name, value) in headers.iter().filter(|(name, _)| *name != HOST.as_str()) {
            builder = builder.header(*name, value);
        }
        for (name, value) in &signature {
            builder = builder.header(name.as_str(), value);
        }

        let response = builder.send().await.map_err(|e| ClientError::Http {
            url: self.endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let request_id = header("x-amzn-requestid").or_else(|| header("x-amz-request-id"));
        let query_error = header("x-amzn-query-error");

        let body = response.text().await.map_err(|e| ClientError::Http {
            url: self.endpoint.to_string(),
            message: e.to_string(),
        })?;

        if !(200..300).contains(&status) {
            return Err(protocol::decode_error(
                operation,
                status,
                query_error.as_deref(),
                &body,
            ));
        }

        let decoded = protocol::decode_response(&self.model, op, &body)?;

        let mut result = decoded.result;
        result.insert(
            "ResponseMetadata".to_string(),
            json!({
                "RequestId": decoded.request_id.or(request_id).unwrap_or_default(),
                "HTTPStatusCode": status,
            }),
        );
        Ok(Value::Object(result))
    }
}

/// Builds clients sharing one HTTP connection pool and credential cache
#[derive(Clone)]
pub struct ClientFactory {
    config: ClientConfig,
    http: Client,
    credentials: Arc<CredentialsCache>,
}

impl ClientFactory {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Http {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let credentials = Arc::new(CredentialsCache::from_default_chain(config.profile.clone()));

        Ok(Self {
            config,
            http,
            credentials,
        })
    }

    /// Use a specific credentials provider instead of the default chain
    pub fn with_credentials_provider(mut self, provider: Arc<dyn ProvideCredentials>) -> Self {
        self.credentials = Arc::new(CredentialsCache::from_provider(provider));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a client for a service in a region
    pub fn client(
        &self,
        model: Arc<ServiceModel>,
        region: &str,
    ) -> Result<AwsServiceClient, ClientError> {
        let endpoint_str = self.config.endpoint(&model.metadata, region);
        let endpoint = url::Url::parse(&endpoint_str).map_err(|e| ClientError::Endpoint {
            url: endpoint_str.clone(),
            message: e.to_string(),
        })?;

        let host = match (endpoint.host_str(), endpoint.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ClientError::Endpoint {
                    url: endpoint_str,
                    message: "endpoint has no host".to_string(),
                })
            }
        };

        Ok(AwsServiceClient {
            model,
            region: region.to_string(),
            endpoint,
            host,
            http: self.http.clone(),
            credentials: self.credentials.clone(),
        })
    }

    /// Accessor creating and caching one client per region
    pub fn accessor(&self, model: Arc<ServiceModel>) -> SharedAccessor {
        let factory = self.clone();
        Arc::new(RegionalClients::new(move |region: &str| {
            let client = factory.client(model.clone(), region)?;
            Ok(Arc::new(client) as Arc<dyn ServiceClient>)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;
    use service_model::ModelLoader;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn factory(endpoint: &str) -> ClientFactory {
        let config = ClientConfig {
            endpoint_url: Some(endpoint.to_string()),
            ..Default::default()
        };
        ClientFactory::new(config)
            .unwrap()
            .with_credentials_provider(Arc::new(Credentials::new(
                "AKIDTEST", "secret", None, None, "test",
            )))
    }

    fn model(service: &str) -> Arc<ServiceModel> {
        Arc::new(ModelLoader::new().load(service).unwrap())
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_endpoints() {
        let config = ClientConfig::default();
        let sns = model("sns");

        assert_eq!(
            config.endpoint(&sns.metadata, "us-east-1"),
            "https://sns.us-east-1.amazonaws.com"
        );
        assert_eq!(
            config.endpoint(&sns.metadata, "cn-north-1"),
            "https://sns.cn-north-1.amazonaws.com.cn"
        );
    }

    #[test]
    fn test_endpoint_overrides_from_env() {
        let config = ClientConfig::from_vars(vec![
            ("AWS_ENDPOINT_URL".to_string(), "http://localhost:4566".to_string()),
            ("AWS_ENDPOINT_URL_SQS".to_string(), "http://localhost:9324".to_string()),
            ("AWS_ENDPOINT_URL_SNS".to_string(), String::new()),
            ("HOME".to_string(), "/root".to_string()),
        ]);

        assert_eq!(
            config.endpoint(&model("sqs").metadata, "us-east-1"),
            "http://localhost:9324"
        );
        assert_eq!(
            config.endpoint(&model("sns").metadata, "us-east-1"),
            "http://localhost:4566"
        );
    }

    #[tokio::test]
    async fn test_query_protocol_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("accept", "application/json"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(body_string_contains("Action=CreateTopic"))
            .and(body_string_contains("Version=2010-03-31"))
            .and(body_string_contains("Name=orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "CreateTopicResponse": {
                    "CreateTopicResult": {"TopicArn": "arn:aws:sns:us-east-1:123456789012:orders"},
                    "ResponseMetadata": {"RequestId": "11111111-2222"}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = factory(&server.uri()).client(model("sns"), "us-east-1").unwrap();
        let result = client
            .call("CreateTopic", args(json!({"Name": "orders"})))
            .await
            .unwrap();

        assert_eq!(
            result,
            json!({
                "TopicArn": "arn:aws:sns:us-east-1:123456789012:orders",
                "ResponseMetadata": {"RequestId": "11111111-2222", "HTTPStatusCode": 200}
            })
        );
    }

    #[tokio::test]
    async fn test_json_protocol_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AmazonSQS.ListQueues"))
            .and(header("content-type", "application/x-amz-json-1.0"))
            .and(body_string_contains("\"QueueNamePrefix\":\"orders\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-amzn-RequestId", "abc-123")
                    .set_body_json(json!({"QueueUrls": ["https://sqs/1/orders"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = factory(&server.uri()).client(model("sqs"), "eu-west-1").unwrap();
        assert_eq!(client.region(), "eu-west-1");

        let result = client
            .call("ListQueues", args(json!({"QueueNamePrefix": "orders"})))
            .await
            .unwrap();

        assert_eq!(result["QueueUrls"], json!(["https://sqs/1/orders"]));
        assert_eq!(result["ResponseMetadata"]["RequestId"], "abc-123");
        assert_eq!(result["ResponseMetadata"]["HTTPStatusCode"], 200);
    }

    #[tokio::test]
    async fn test_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("x-amzn-query-error", "AWS.SimpleQueueService.NonExistentQueue;Sender")
                    .set_body_json(json!({
                        "__type": "com.amazonaws.sqs#QueueDoesNotExist",
                        "message": "The specified queue does not exist."
                    })),
            )
            .mount(&server)
            .await;

        let client = factory(&server.uri()).client(model("sqs"), "us-east-1").unwrap();
        let err = client
            .call("GetQueueUrl", args(json!({"QueueName": "missing"})))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Service { status: 400, .. }));
        assert_eq!(err.code(), Some("AWS.SimpleQueueService.NonExistentQueue"));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let client = factory("http://localhost:1").client(model("sqs"), "us-east-1").unwrap();
        let err = client.call("FlyToTheMoon", Map::new()).await.unwrap_err();
        assert_eq!(err, ClientError::UnknownOperation("FlyToTheMoon".to_string()));
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = factory("not a url").client(model("sns"), "us-east-1").err().unwrap();
        assert!(matches!(err, ClientError::Endpoint { .. }));
    }
}
