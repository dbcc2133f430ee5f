//! Redirect following for media downloads.
//!
//! A redirect is followed only when the request does not ask for that status
//! back (see [`StatusHandling`](crate::StatusHandling)). Media pipelines with
//! redirects disabled tag their requests with `StatusHandling::All`, so a 302
//! reaches the policy as a 302 response.

use http::{Method, StatusCode, header};
use serde_json::Value;
use std::future::Future;
use tracing::debug;

use crate::error::SpiderError;
use crate::request::Request;
use crate::response::Response;

pub const DEFAULT_MAX_REDIRECTS: usize = 20;

const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Builds the follow-up request for a redirect response, or `None` when
/// `response` is not a redirect the downloader should follow.
pub fn redirect_request(
    request: &Request,
    response: &Response,
) -> Result<Option<Request>, SpiderError> {
    let status = response.status.as_u16();
    if !REDIRECT_STATUSES.contains(&status) || request.status_handling.handles(status) {
        return Ok(None);
    }
    let Some(location) = response.headers.get(header::LOCATION) else {
        return Ok(None);
    };

    // Servers do send raw latin-1 here.
    let location: String = match location.to_str() {
        Ok(s) => s.to_owned(),
        Err(_) => location.as_bytes().iter().map(|&b| b as char).collect(),
    };
    let target = response
        .url
        .join(&location)
        .map_err(|_| SpiderError::InvalidRedirect {
            url: response.url.clone(),
            location: location.clone(),
        })?;

    let mut next = request.clone();
    if matches!(
        response.status,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
    ) && next.method != Method::HEAD
    {
        next.method = Method::GET;
        next.body = Default::default();
        next.headers.remove(header::CONTENT_TYPE);
        next.headers.remove(header::CONTENT_LENGTH);
    }
    if target.host_str() != request.url.host_str() || target.scheme() != request.url.scheme() {
        next.headers.remove(header::AUTHORIZATION);
        next.headers.remove(header::COOKIE);
    }

    let mut redirect_urls = match next.meta.remove("redirect_urls") {
        Some(Value::Array(urls)) => urls,
        _ => Vec::new(),
    };
    redirect_urls.push(Value::from(request.url.as_str()));
    next.meta
        .insert("redirect_times".into(), Value::from(redirect_urls.len()));
    next.meta
        .insert("redirect_urls".into(), Value::Array(redirect_urls));
    next.url = target;
    Ok(Some(next))
}

/// Sends `request` through `send`, following redirects until a final response.
///
/// A final status the request does not handle becomes
/// [`SpiderError::HttpStatus`].
pub async fn follow_redirects<F, Fut>(
    request: Request,
    max_redirects: usize,
    mut send: F,
) -> Result<Response, SpiderError>
where
    F: FnMut(Request) -> Fut,
    Fut: Future<Output = Result<Response, SpiderError>>,
{
    let original_url = request.url.clone();
    let mut current = request;
    let mut hops = 0;

    loop {
        let mut response = send(current.clone()).await?;
        match redirect_request(&current, &response)? {
            Some(next) => {
                hops += 1;
                if hops > max_redirects {
                    return Err(SpiderError::TooManyRedirects {
                        url: original_url,
                        max: max_redirects,
                    });
                }
                debug!(
                    "Redirecting ({}) to {} from {}",
                    response.status.as_u16(),
                    next.url,
                    current.url
                );
                current = next;
            }
            None => {
                let status = response.status.as_u16();
                if !current.status_handling.handles(status) {
                    return Err(SpiderError::HttpStatus {
                        status,
                        url: response.url,
                    });
                }
                response.request_url = original_url;
                return Ok(response);
            }
        }
    }
}
