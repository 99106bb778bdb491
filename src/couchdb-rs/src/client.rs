use std::collections::HashMap;

use couchdb_core::models::{ErrorBody, SessionRequest};
use couchdb_core::{AuthMethod, ClientConfig, Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client as HttpClient, Method, StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};

/// CouchDB REST API Client
///
/// One instance owns one transport with a fixed base URL and default
/// headers. All operations are stateless pass-throughs: build a request,
/// perform one round trip, decode the JSON body or map the status code to
/// an [`Error`] variant.
#[derive(Debug)]
pub struct Client {
    base_url: Url,
    http: HttpClient,
}

/// Per-call request pieces consumed by the shared executor.
#[derive(Default)]
struct RequestOptions<'a> {
    query: &'a [(&'a str, &'a str)],
    json: Option<&'a Value>,
    body: Option<String>,
    headers: &'a [(&'a str, &'a str)],
}

#[derive(Serialize)]
struct KeysRequest<'a> {
    keys: &'a [&'a str],
}

#[derive(Serialize)]
struct BulkDocumentsRequest<'a> {
    docs: &'a [Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    new_edits: Option<bool>,
}

impl Client {
    /// Connects with the default transport settings.
    ///
    /// Basic mode embeds the (percent-encoded) credentials into the base
    /// URL authority and performs no network call. Cookie mode issues one
    /// `POST /_session` and installs the returned `Set-Cookie` value as
    /// the default `Cookie` header for the lifetime of the client; the
    /// cookie is never refreshed.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        Self::connect_with(config, HttpClient::builder()).await
    }

    /// Connects through a caller-supplied transport builder.
    ///
    /// The builder carries transport-level overrides (timeouts, proxies);
    /// default headers are installed on top of it. In cookie mode the
    /// one-time session bootstrap uses a plain transport with the same
    /// default headers, and the builder applies to the final client only.
    pub async fn connect_with(config: ClientConfig, transport: reqwest::ClientBuilder) -> Result<Self> {
        let mut base_url = Url::parse(&format!("http://{}:{}/", config.host, config.port))
            .map_err(|e| Error::InvalidArgument {
                message: format!("invalid host or port: {}", e),
            })?;

        match config.auth {
            AuthMethod::Basic => {
                base_url
                    .set_username(&config.username)
                    .map_err(|_| credentials_error())?;
                base_url
                    .set_password(Some(&config.password))
                    .map_err(|_| credentials_error())?;
                let http = build_transport(transport, &config.headers, None)?;
                Ok(Self { base_url, http })
            }
            AuthMethod::Cookie => {
                let cookie = session_cookie(&config, &base_url).await?;
                let http = build_transport(transport, &config.headers, Some(&cookie))?;
                Ok(Self { base_url, http })
            }
        }
    }

    /// Base URL every request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns a list of all the databases in the instance.
    ///
    /// <https://docs.couchdb.org/en/stable/api/server/common.html#all-dbs>
    pub async fn get_all_databases(&self) -> Result<Value> {
        self.execute(Method::GET, "/_all_dbs", RequestOptions::default())
            .await
    }

    /// Checks if the database exists.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/common.html#head--db>
    pub async fn is_database_exists(&self, db: &str) -> Result<bool> {
        let result = self
            .execute(Method::HEAD, &format!("/{}", db), RequestOptions::default())
            .await;
        found(result)
    }

    /// Returns information about the database.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/common.html#get--db>
    pub async fn get_database(&self, db: &str) -> Result<Value> {
        self.execute(Method::GET, &format!("/{}", db), RequestOptions::default())
            .await
    }

    /// Creates a new database. `params` carries placement options such as
    /// `q` (shards) and `n` (replicas).
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/common.html#put--db>
    pub async fn create_database(&self, db: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/{}", db),
            RequestOptions {
                query: params,
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes an existing database.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/common.html#delete--db>
    pub async fn delete_database(&self, db: &str) -> Result<Value> {
        self.execute(Method::DELETE, &format!("/{}", db), RequestOptions::default())
            .await
    }

    /// Returns all documents of the database.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/bulk-api.html#get--db-_all_docs>
    pub async fn get_all_documents(&self, db: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.execute(
            Method::GET,
            &format!("/{}/_all_docs", db),
            RequestOptions {
                query: params,
                ..Default::default()
            },
        )
        .await
    }

    /// Returns the rows of the `_all_docs` view matching the given keys.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/bulk-api.html#post--db-_all_docs>
    pub async fn get_all_documents_by_keys(
        &self,
        db: &str,
        keys: &[&str],
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let body = serde_json::to_value(KeysRequest { keys })?;
        self.execute(
            Method::POST,
            &format!("/{}/_all_docs", db),
            RequestOptions {
                query: params,
                json: Some(&body),
                ..Default::default()
            },
        )
        .await
    }

    /// Bulk design document retrieval is not supported.
    pub async fn get_design_documents(&self, _db: &str, _params: &[(&str, &str)]) -> Result<Value> {
        Err(Error::NotImplemented)
    }

    /// Bulk design document retrieval by key set is not supported.
    pub async fn get_design_documents_by_keys(
        &self,
        _db: &str,
        _keys: &[&str],
        _params: &[(&str, &str)],
    ) -> Result<Value> {
        Err(Error::NotImplemented)
    }

    /// The `_bulk_get` endpoint is not supported.
    pub async fn get_bulk_documents(
        &self,
        _db: &str,
        _docs: &[Value],
        _params: &[(&str, &str)],
    ) -> Result<Value> {
        Err(Error::NotImplemented)
    }

    /// Inserts or updates multiple documents in a single request.
    ///
    /// With `new_edits` set to `false` the documents are replicated as-is
    /// and the `new_edits` key is put on the wire; otherwise the body
    /// carries only `docs`.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/bulk-api.html#post--db-_bulk_docs>
    pub async fn bulk_documents(&self, db: &str, docs: &[Value], new_edits: bool) -> Result<Value> {
        let body = serde_json::to_value(BulkDocumentsRequest {
            docs,
            new_edits: (!new_edits).then_some(false),
        })?;
        self.execute(
            Method::POST,
            &format!("/{}/_bulk_docs", db),
            RequestOptions {
                json: Some(&body),
                ..Default::default()
            },
        )
        .await
    }

    /// Finds documents using a Mango selector.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/find.html#db-find>
    pub async fn find_documents(&self, db: &str, query: &Value) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_find", db),
            RequestOptions {
                json: Some(query),
                ..Default::default()
            },
        )
        .await
    }

    /// Creates a new Mango index.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/find.html#post--db-_index>
    pub async fn create_index(&self, db: &str, index: &Value) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_index", db),
            RequestOptions {
                json: Some(index),
                ..Default::default()
            },
        )
        .await
    }

    /// Lists all indexes of the database.
    pub async fn get_indexes(&self, db: &str) -> Result<Value> {
        self.execute(Method::GET, &format!("/{}/_index", db), RequestOptions::default())
            .await
    }

    /// Deletes an index.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/find.html#delete--db-_index-designdoc-json-name>
    pub async fn delete_index(&self, db: &str, ddoc: &str, index: &str) -> Result<Value> {
        self.execute(
            Method::DELETE,
            &format!("/{}/_index/{}/json/{}", db, ddoc, index),
            RequestOptions::default(),
        )
        .await
    }

    /// Shows which index the given Mango query would use.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/find.html#db-explain>
    pub async fn explain(&self, db: &str, query: &Value) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_explain", db),
            RequestOptions {
                json: Some(query),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns the shard ranges of the database.
    pub async fn get_database_shards(&self, db: &str) -> Result<Value> {
        self.execute(Method::GET, &format!("/{}/_shards", db), RequestOptions::default())
            .await
    }

    /// Returns the shard a given document is stored in.
    pub async fn get_document_shards(&self, db: &str, docid: &str) -> Result<Value> {
        self.execute(
            Method::GET,
            &format!("/{}/_shards/{}", db, docid),
            RequestOptions::default(),
        )
        .await
    }

    /// Returns the changes made to documents in the database.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/changes.html#get--db-_changes>
    pub async fn get_database_changes(&self, db: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.execute(
            Method::GET,
            &format!("/{}/_changes", db),
            RequestOptions {
                query: params,
                ..Default::default()
            },
        )
        .await
    }

    /// Changes feed with a criteria body, typically a document id list
    /// combined with the `filter=_doc_ids` query parameter.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/changes.html#post--db-_changes>
    pub async fn get_database_changes_by_criteria(
        &self,
        db: &str,
        criteria: &Value,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_changes", db),
            RequestOptions {
                query: params,
                json: Some(criteria),
                ..Default::default()
            },
        )
        .await
    }

    /// Starts compaction of the database.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/compact.html#db-compact>
    pub async fn compact_database(&self, db: &str) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_compact", db),
            RequestOptions::default(),
        )
        .await
    }

    /// Starts compaction of the view indexes of a design document.
    pub async fn compact_design_document(&self, db: &str, ddoc: &str) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_compact/{}", db, ddoc),
            RequestOptions::default(),
        )
        .await
    }

    /// Commits recent changes of the database to disk.
    pub async fn ensure_full_commit(&self, db: &str) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_ensure_full_commit", db),
            RequestOptions::default(),
        )
        .await
    }

    /// Removes view index files no longer required by any design document.
    pub async fn cleanup_view(&self, db: &str) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_view_cleanup", db),
            RequestOptions::default(),
        )
        .await
    }

    /// Returns the security object of the database.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/security.html#get--db-_security>
    pub async fn get_security_info(&self, db: &str) -> Result<Value> {
        self.execute(Method::GET, &format!("/{}/_security", db), RequestOptions::default())
            .await
    }

    /// Replaces the security object of the database.
    pub async fn set_security_info(&self, db: &str, security: &Value) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/{}/_security", db),
            RequestOptions {
                json: Some(security),
                ..Default::default()
            },
        )
        .await
    }

    /// Permanently removes documents and their revision history. `revs`
    /// maps document ids to the revisions to purge.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/misc.html#db-purge>
    pub async fn purge(&self, db: &str, revs: &Value) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_purge", db),
            RequestOptions {
                json: Some(revs),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns how many historical purges the database keeps track of.
    pub async fn get_purged_limit(&self, db: &str) -> Result<u64> {
        let value = self
            .execute(
                Method::GET,
                &format!("/{}/_purged_infos_limit", db),
                RequestOptions::default(),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sets how many historical purges the database keeps track of. The
    /// limit goes on the wire as a bare integer body.
    pub async fn set_purged_limit(&self, db: &str, limit: u64) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/{}/_purged_infos_limit", db),
            RequestOptions {
                body: Some(limit.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Given id → revisions pairs, returns the revisions the database does
    /// not have.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/misc.html#post--db-_missing_revs>
    pub async fn get_missed_revisions(&self, db: &str, revs: &Value) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_missing_revs", db),
            RequestOptions {
                json: Some(revs),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns the differences between the given revisions and those
    /// stored in the database.
    pub async fn get_revisions_diff(&self, db: &str, revs: &Value) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}/_revs_diff", db),
            RequestOptions {
                json: Some(revs),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns how many historical revisions a document keeps.
    pub async fn get_revisions_limit(&self, db: &str) -> Result<u64> {
        let value = self
            .execute(
                Method::GET,
                &format!("/{}/_revs_limit", db),
                RequestOptions::default(),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sets how many historical revisions a document keeps. Bare integer
    /// body, same wire shape as [`Client::set_purged_limit`].
    pub async fn set_revisions_limit(&self, db: &str, limit: u64) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/{}/_revs_limit", db),
            RequestOptions {
                body: Some(limit.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    /// Checks if the document exists.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/common.html#head--db-docid>
    pub async fn is_document_exists(&self, db: &str, docid: &str) -> Result<bool> {
        let result = self
            .execute(
                Method::HEAD,
                &format!("/{}/{}", db, docid),
                RequestOptions::default(),
            )
            .await;
        found(result)
    }

    /// Returns the document with the given id.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/common.html#get--db-docid>
    pub async fn get_document(&self, db: &str, docid: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.execute(
            Method::GET,
            &format!("/{}/{}", db, docid),
            RequestOptions {
                query: params,
                ..Default::default()
            },
        )
        .await
    }

    /// Creates a new document with a server-assigned id.
    ///
    /// <https://docs.couchdb.org/en/stable/api/database/common.html#post--db>
    pub async fn create_document(&self, db: &str, doc: &Value, params: &[(&str, &str)]) -> Result<Value> {
        self.execute(
            Method::POST,
            &format!("/{}", db),
            RequestOptions {
                query: params,
                json: Some(doc),
                ..Default::default()
            },
        )
        .await
    }

    /// Creates a named document, or a new revision of an existing one.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/common.html#put--db-docid>
    pub async fn update_document(
        &self,
        db: &str,
        docid: &str,
        doc: &Value,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/{}/{}", db, docid),
            RequestOptions {
                query: params,
                json: Some(doc),
                ..Default::default()
            },
        )
        .await
    }

    /// Marks the document as deleted. `rev` is appended to whatever extra
    /// query parameters are given.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/common.html#delete--db-docid>
    pub async fn delete_document(
        &self,
        db: &str,
        docid: &str,
        rev: &str,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("rev", rev));
        self.execute(
            Method::DELETE,
            &format!("/{}/{}", db, docid),
            RequestOptions {
                query: &query,
                ..Default::default()
            },
        )
        .await
    }

    /// Copies the document within the database. The target document id
    /// (and optionally `?rev=`) travels in the `Destination` header.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/common.html#copy--db-docid>
    pub async fn copy_document(
        &self,
        db: &str,
        docid: &str,
        destination: &str,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let copy = Method::from_bytes(b"COPY").map_err(|e| Error::InvalidArgument {
            message: e.to_string(),
        })?;
        self.execute(
            copy,
            &format!("/{}/{}", db, docid),
            RequestOptions {
                query: params,
                headers: &[("Destination", destination)],
                ..Default::default()
            },
        )
        .await
    }

    /// Checks if the attachment exists.
    pub async fn is_document_attachment_exists(
        &self,
        db: &str,
        docid: &str,
        attname: &str,
        rev: Option<&str>,
    ) -> Result<bool> {
        let query: Vec<(&str, &str)> = rev.map(|rev| vec![("rev", rev)]).unwrap_or_default();
        let result = self
            .execute(
                Method::HEAD,
                &format!("/{}/{}/{}", db, docid, attname),
                RequestOptions {
                    query: &query,
                    ..Default::default()
                },
            )
            .await;
        found(result)
    }

    /// Returns the attachment associated with the document.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/attachments.html#get--db-docid-attname>
    pub async fn get_document_attachment(
        &self,
        db: &str,
        docid: &str,
        attname: &str,
        rev: Option<&str>,
    ) -> Result<Value> {
        let query: Vec<(&str, &str)> = rev.map(|rev| vec![("rev", rev)]).unwrap_or_default();
        self.execute(
            Method::GET,
            &format!("/{}/{}/{}", db, docid, attname),
            RequestOptions {
                query: &query,
                ..Default::default()
            },
        )
        .await
    }

    /// Uploads `att` as an attachment of the given document revision.
    ///
    /// <https://docs.couchdb.org/en/stable/api/document/attachments.html#put--db-docid-attname>
    pub async fn create_document_attachment(
        &self,
        db: &str,
        docid: &str,
        attname: &str,
        rev: &str,
        att: &Value,
    ) -> Result<Value> {
        self.execute(
            Method::PUT,
            &format!("/{}/{}/{}", db, docid, attname),
            RequestOptions {
                query: &[("rev", rev)],
                json: Some(att),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes an attachment of the document.
    pub async fn delete_document_attachment(
        &self,
        db: &str,
        docid: &str,
        attname: &str,
        rev: &str,
        params: &[(&str, &str)],
    ) -> Result<Value> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("rev", rev));
        self.execute(
            Method::DELETE,
            &format!("/{}/{}/{}", db, docid, attname),
            RequestOptions {
                query: &query,
                ..Default::default()
            },
        )
        .await
    }

    /// Performs one HTTP round trip and interprets the result.
    ///
    /// Invoked by every public operation; the status-to-error mapping
    /// happens here and nowhere else. A 2xx response with an empty body
    /// (HEAD, bodiless POST replies) decodes to the empty JSON object.
    async fn execute(&self, method: Method, path: &str, opts: RequestOptions<'_>) -> Result<Value> {
        let url = self.base_url.join(path).map_err(|e| Error::InvalidArgument {
            message: format!("invalid request path {}: {}", path, e),
        })?;

        tracing::debug!(method = %method, path, "sending request");

        let mut request = self.http.request(method, url);
        if !opts.query.is_empty() {
            request = request.query(opts.query);
        }
        if let Some(json) = opts.json {
            request = request.json(json);
        }
        if let Some(body) = opts.body {
            request = request.body(body);
        }
        for (name, value) in opts.headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(Error::connection)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::connection)?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        if body.is_empty() {
            Ok(Value::Object(Map::new()))
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }
}

/// Collapses the NotFound variant of an existence probe into `false`;
/// every other error propagates.
fn found(result: Result<Value>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(Error::NotFound { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let fallback = status.canonical_reason().unwrap_or("unknown status");
    Error::from_status(status.as_u16(), ErrorBody::message_from(body, fallback))
}

fn credentials_error() -> Error {
    Error::InvalidArgument {
        message: "base URL does not accept credentials".to_string(),
    }
}

/// Performs the one-time `POST /_session` login and returns the verbatim
/// `Set-Cookie` header value.
async fn session_cookie(config: &ClientConfig, base_url: &Url) -> Result<String> {
    let url = base_url.join("/_session").map_err(|e| Error::InvalidArgument {
        message: format!("invalid session URL: {}", e),
    })?;
    let bootstrap = build_transport(HttpClient::builder(), &config.headers, None)?;

    tracing::debug!(host = %config.host, "requesting session cookie");

    let response = bootstrap
        .post(url)
        .json(&SessionRequest {
            name: &config.username,
            password: &config.password,
        })
        .send()
        .await
        .map_err(Error::connection)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.map_err(Error::connection)?;
        return Err(status_error(status, &body));
    }

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Ok(cookie)
}

/// Builds the transport with the default header set: `Content-Type:
/// application/json`, then the caller-supplied headers (the caller wins on
/// a key collision), then the session cookie.
fn build_transport(
    builder: reqwest::ClientBuilder,
    extra: &HashMap<String, String>,
    cookie: Option<&str>,
) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidArgument {
            message: format!("invalid header name {}: {}", name, e),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::InvalidArgument {
            message: format!("invalid value for header {}: {}", name, e),
        })?;
        headers.insert(name, value);
    }

    if let Some(cookie) = cookie {
        let value = HeaderValue::from_str(cookie).map_err(|e| Error::InvalidArgument {
            message: format!("invalid session cookie: {}", e),
        })?;
        headers.insert(COOKIE, value);
    }

    builder
        .default_headers(headers)
        .build()
        .map_err(Error::connection)
}
