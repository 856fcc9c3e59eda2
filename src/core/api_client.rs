use crate::adapters::{LogNotifier, StaticToken};
use crate::config::ClientConfig;
use crate::domain::model::{FormInput, FormPayload, RequestOptions, ResponseBody};
use crate::domain::ports::{Document, Notifier, TokenProvider};
use crate::utils::error::{Result, UiError};
use crate::utils::validation::Validate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// HTTP client for the page: bearer auth, toast-on-error, and optional
/// splicing of the returned HTML into the document.
pub struct ApiClient<D: Document> {
    http: Client,
    base_url: Option<Url>,
    timeout_delay: Duration,
    token_provider: Arc<dyn TokenProvider>,
    notifier: Arc<dyn Notifier>,
    document: Arc<D>,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder<D: Document> {
    document: Arc<D>,
    base_url: Option<String>,
    timeout_delay: Duration,
    token_provider: Option<Arc<dyn TokenProvider>>,
    notifier: Option<Arc<dyn Notifier>>,
    user_agent: Option<String>,
}

impl<D: Document> ApiClientBuilder<D> {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Fixed wait before every authenticated request (default 200ms).
    pub fn timeout_delay(mut self, delay: Duration) -> Self {
        self.timeout_delay = delay;
        self
    }

    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ApiClient<D>> {
        let base_url = self
            .base_url
            .map(|raw| {
                Url::parse(&raw).map_err(|e| UiError::InvalidConfigValueError {
                    field: "base_url".to_string(),
                    value: raw.clone(),
                    reason: format!("Invalid URL format: {}", e),
                })
            })
            .transpose()?;

        let mut headers = HeaderMap::new();
        if let Some(agent) = self.user_agent {
            let value =
                HeaderValue::from_str(&agent).map_err(|e| UiError::InvalidConfigValueError {
                    field: "user_agent".to_string(),
                    value: agent.clone(),
                    reason: e.to_string(),
                })?;
            headers.insert(USER_AGENT, value);
        }

        Ok(ApiClient {
            http: Client::builder().default_headers(headers).build()?,
            base_url,
            timeout_delay: self.timeout_delay,
            token_provider: self
                .token_provider
                .unwrap_or_else(|| Arc::new(StaticToken::none())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            document: self.document,
        })
    }
}

impl<D: Document> ApiClient<D> {
    pub fn builder(document: Arc<D>) -> ApiClientBuilder<D> {
        ApiClientBuilder {
            document,
            base_url: None,
            timeout_delay: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_DELAY_MS),
            token_provider: None,
            notifier: None,
            user_agent: None,
        }
    }

    /// Validates `config` and builds a client from it. A token in the config,
    /// when present, takes precedence over `token_provider`.
    pub fn from_config(
        config: &ClientConfig,
        document: Arc<D>,
        token_provider: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;

        let provider: Arc<dyn TokenProvider> = match config.token() {
            Some(token) => Arc::new(StaticToken::new(token)),
            None => token_provider,
        };

        let mut builder = Self::builder(document)
            .base_url(config.client.base_url.clone())
            .timeout_delay(config.timeout_delay())
            .token_provider(provider)
            .notifier(notifier);
        if let Some(agent) = &config.client.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn timeout_delay(&self) -> Duration {
        self.timeout_delay
    }

    /// Absolute URLs pass through; paths are joined onto the base URL.
    pub fn resolve_url(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| UiError::ConfigError {
                    message: format!("Cannot resolve relative URL '{}' without a base_url", url),
                })?;
                base.join(url).map_err(|e| UiError::ConfigError {
                    message: format!("Cannot resolve '{}' against {}: {}", url, base, e),
                })
            }
            Err(e) => Err(UiError::ConfigError {
                message: format!("Invalid URL '{}': {}", url, e),
            }),
        }
    }

    async fn bearer_token(&self) -> Result<String> {
        self.token_provider
            .token()
            .await
            .filter(|t| !t.is_empty())
            .ok_or(UiError::AuthError)
    }

    async fn wait_before_request(&self) {
        if !self.timeout_delay.is_zero() {
            #[cfg(not(target_arch = "wasm32"))]
            tokio::time::sleep(self.timeout_delay).await;
            #[cfg(target_arch = "wasm32")]
            gloo_timers::future::sleep(self.timeout_delay).await;
        }
    }

    fn report_failure(&self, context: &str, err: &UiError) {
        tracing::error!("{}: {}", context, err);
        self.notifier.show_toast(&format!("Error: {}", err), true);
    }

    /// 帶授權的請求：token、延遲、狀態檢查
    async fn send_authenticated(
        &self,
        url: &str,
        method: Method,
        options: RequestOptions,
    ) -> Result<Response> {
        let token = self.bearer_token().await?;
        let url = self.resolve_url(url)?;

        let mut request = self.http.request(method.clone(), url.clone());
        for (key, value) in &options.headers {
            if !key.eq_ignore_ascii_case(AUTHORIZATION.as_str()) {
                request = request.header(key, value);
            }
        }
        request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        if let Some(body) = options.body {
            request = request.multipart(multipart_form(body));
        }

        self.wait_before_request().await;

        tracing::debug!("Making {} request to: {}", method, url);
        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());

        ensure_success(response)
    }

    async fn try_request_json(&self, url: &str, options: RequestOptions) -> Result<ResponseBody> {
        let method = options.method.clone();
        let response = self.send_authenticated(url, method, options).await?;

        if is_json(&response) {
            Ok(ResponseBody::Json(response.json().await?))
        } else {
            Ok(ResponseBody::Text(response.text().await?))
        }
    }

    /// Authenticated request. JSON responses are decoded, anything else comes back as text.
    pub async fn request_json(&self, url: &str, options: RequestOptions) -> Result<ResponseBody> {
        self.try_request_json(url, options)
            .await
            .inspect_err(|e| self.report_failure("API request failed", e))
    }

    async fn try_submit_form(
        &self,
        url: &str,
        form: FormPayload,
        method: Method,
        target: Option<&str>,
    ) -> Result<String> {
        let options = RequestOptions::new().form(form);
        let response = self.send_authenticated(url, method, options).await?;
        let text = response.text().await?;

        if let Some(selector) = target.filter(|_| !text.is_empty()) {
            self.replace_inner_html(selector, &text);
        }

        Ok(text)
    }

    /// Sends `form` as multipart. A non-empty response replaces the content of `target`.
    pub async fn submit_form(
        &self,
        url: &str,
        form: FormPayload,
        method: Method,
        target: Option<&str>,
    ) -> Result<String> {
        self.try_submit_form(url, form, method, target)
            .await
            .inspect_err(|e| self.report_failure("API form submission failed", e))
    }

    async fn try_delete_resource(&self, url: &str, target: Option<&str>) -> Result<bool> {
        let response = self
            .send_authenticated(url, Method::DELETE, RequestOptions::new())
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                if let Some(node) = target.and_then(|s| self.document.query_selector(s)) {
                    self.document.remove(&node);
                }
            }
            StatusCode::OK => {
                let text = response.text().await?;
                if let Some(selector) = target.filter(|_| !text.is_empty()) {
                    self.replace_inner_html(selector, &text);
                }
            }
            _ => {}
        }

        Ok(true)
    }

    /// DELETE. 204 removes `target`, 200 replaces its content with the response.
    pub async fn delete_resource(&self, url: &str, target: Option<&str>) -> Result<bool> {
        self.try_delete_resource(url, target)
            .await
            .inspect_err(|e| self.report_failure("API delete failed", e))
    }

    pub async fn update(
        &self,
        url: &str,
        data: impl Into<FormInput>,
        target: Option<&str>,
    ) -> Result<String> {
        self.submit_form(url, data.into().into_payload(), Method::PUT, target)
            .await
    }

    pub async fn patch(
        &self,
        url: &str,
        data: impl Into<FormInput>,
        target: Option<&str>,
    ) -> Result<String> {
        self.submit_form(url, data.into().into_payload(), Method::PATCH, target)
            .await
    }

    /// GET `url` and render the result into `target`. Best effort: errors are only logged.
    pub async fn load_and_render(&self, url: &str, target: &str) {
        self.load_and_render_with(url, target, RequestOptions::new(), None)
            .await
    }

    pub async fn load_and_render_with(
        &self,
        url: &str,
        target: &str,
        options: RequestOptions,
        after_render: Option<&(dyn Fn() + Send + Sync)>,
    ) {
        let body = match self.request_json(url, options).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Load and render error: {}", e);
                return;
            }
        };

        let Some(node) = self.document.query_selector(target) else {
            tracing::warn!("Target {} not found.", target);
            return;
        };
        self.document.set_inner_html(&node, &body.into_html());

        if let Some(callback) = after_render {
            callback();
        }
    }

    /// Plain GET without credentials, for public fragments.
    ///
    /// Unlike the render helpers this does not splice anything on its own, and a
    /// non-2xx answer is an `HttpError` instead of text, so callers never insert
    /// an error page into the document. No toast is shown.
    pub async fn fetch_fragment(&self, url: &str) -> Result<String> {
        let url = self.resolve_url(url)?;
        tracing::debug!("Fetching fragment: {}", url);
        let response = ensure_success(self.http.get(url).send().await?)?;
        Ok(response.text().await?)
    }

    fn replace_inner_html(&self, selector: &str, html: &str) {
        match self.document.query_selector(selector) {
            Some(node) => self.document.set_inner_html(&node, html),
            None => tracing::debug!("Target {} not found, response not rendered", selector),
        }
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(UiError::HttpError {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"))
}

fn multipart_form(payload: FormPayload) -> Form {
    payload
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}
