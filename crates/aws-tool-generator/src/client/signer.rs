//! SigV4 request signing

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use std::time::SystemTime;

use super::error::ClientError;

/// Region, service and time a signature is scoped to
#[derive(Debug, Clone, Copy)]
pub(crate) struct SigningScope<'a> {
    pub region: &'a str,
    pub signing_name: &'a str,
    pub time: SystemTime,
}

/// Sign a request and return the headers to add to it
///
/// `headers` must contain every header that will be sent and is meant to be
/// covered by the signature, including `host`.
pub(crate) fn signature_headers(
    method: &str,
    url: &str,
    headers: &[(&str, String)],
    body: &[u8],
    credentials: Credentials,
    scope: SigningScope<'_>,
) -> Result<Vec<(String, String)>, ClientError> {
    let identity = credentials.into();
    let signing_params = v4::SigningParams::builder()
        .identity(&identity)
        .region(scope.region)
        .name(scope.signing_name)
        .time(scope.time)
        .settings(SigningSettings::default())
        .build()
        .map_err(|e| ClientError::Signing(e.to_string()))?;

    let signable_request = SignableRequest::new(
        method,
        url,
        headers.iter().map(|(name, value)| (*name, value.as_str())),
        SignableBody::Bytes(body),
    )
    .map_err(|e| ClientError::Signing(e.to_string()))?;

    let (instructions, _signature) = sign(signable_request, &signing_params.into())
        .map_err(|e| ClientError::Signing(e.to_string()))?
        .into_parts();

    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}
