//! Generic lifecycle engine.
//!
//! One [`ResourceEngine`] drives one [`ResourceSchema`] over a [`Transport`].
//! The flow is the same for every object type:
//!
//! 1. validate the caller's attributes against the schema
//! 2. resolve or build the endpoint
//! 3. encode the write payload, if any
//! 4. send the request
//! 5. unwrap search envelopes
//! 6. decode every declared attribute, aggregating conversion problems
//! 7. run the schema's hooks
//!
//! Field conversion problems end up in [`Outcome::diagnostics`]. Everything
//! else aborts the operation with an [`OperationError`].

use crate::hooks::{run_hooks, CallContext, Callee, Source};
use crate::marshal::{decode_object, encode_body};
use crate::resolve::{resolve, LookupStyle, ResolvedEndpoint};
use crate::schema::ResourceSchema;
use crate::transport::Transport;
use awx_client::Method;
use awx_core::{envelope, ApiObject, ApiValue, AttributeSet, Diagnostic, Diagnostics, Error};
use thiserror::Error;
use tracing::{debug, info};

/// Decoded state plus the problems found while decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Decoded attributes, one entry per declared attribute
    pub state: AttributeSet,
    /// Field conversion diagnostics
    pub diagnostics: Diagnostics,
}

/// A failed lifecycle operation, with the endpoint it was working on.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unable to {action} {type_name} on {endpoint}")]
pub struct OperationError {
    /// Operation that failed
    pub action: Callee,
    /// Object type
    pub type_name: &'static str,
    /// Endpoint being worked on
    pub endpoint: String,
    /// Underlying failure
    #[source]
    pub source: Error,
}

impl OperationError {
    /// Convert into a single error diagnostic: the summary names the
    /// operation and endpoint, the detail is the underlying error.
    #[must_use]
    pub fn into_diagnostic(self) -> Diagnostic {
        let summary = self.to_string();
        self.source.into_diagnostic(summary)
    }
}

/// Result of a lifecycle operation.
pub type OperationResult<T> = std::result::Result<T, OperationError>;

/// Drives create, read, update, delete and lookup for one object type.
#[derive(Debug, Clone)]
pub struct ResourceEngine<T> {
    transport: T,
    schema: ResourceSchema,
}

impl<T: Transport> ResourceEngine<T> {
    /// Create an engine for `schema`.
    pub const fn new(transport: T, schema: ResourceSchema) -> Self {
        Self { transport, schema }
    }

    /// The schema this engine drives.
    pub const fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn fail(&self, action: Callee, endpoint: impl Into<String>, source: Error) -> OperationError {
        OperationError {
            action,
            type_name: self.schema.type_name,
            endpoint: endpoint.into(),
            source,
        }
    }

    fn check(&self, action: Callee, endpoint: &str, diagnostics: &Diagnostics) -> OperationResult<()> {
        if !diagnostics.has_error() {
            return Ok(());
        }
        let details: Vec<String> = diagnostics.errors().map(|d| d.detail.clone()).collect();
        Err(self.fail(action, endpoint, Error::Config(details.join("; "))))
    }

    fn object_endpoint(&self, action: Callee, state: &AttributeSet) -> OperationResult<String> {
        if self.schema.singleton {
            return Ok(self.schema.endpoint.to_string());
        }
        match self.schema.id_of(state) {
            Some(id) => Ok(self.schema.object_endpoint(&id)),
            None => Err(self.fail(
                action,
                self.schema.endpoint,
                Error::Config(format!("`{}` is not known", self.schema.id_attribute)),
            )),
        }
    }

    async fn send(
        &self,
        action: Callee,
        method: Method,
        endpoint: &str,
        body: Option<ApiObject>,
    ) -> OperationResult<ApiObject> {
        if let Some(body) = &body {
            let fields: Vec<&str> = body.keys().map(String::as_str).collect();
            debug!(type_name = self.schema.type_name, %method, endpoint, ?fields, "sending payload");
        }
        self.transport
            .request(method, endpoint, body.map(ApiValue::Object))
            .await
            .map_err(|e| self.fail(action, endpoint, e))
    }

    fn finish(
        &self,
        ctx: &CallContext,
        endpoint: &str,
        object: &ApiObject,
        prior: Option<&AttributeSet>,
    ) -> OperationResult<Outcome> {
        let mut diagnostics = Diagnostics::new();
        let mut state = decode_object(&self.schema, object, &mut diagnostics);
        run_hooks(ctx, &self.schema, prior, &mut state).map_err(|e| self.fail(ctx.callee, endpoint, e))?;

        if diagnostics.has_error() {
            debug!(
                type_name = self.schema.type_name,
                endpoint,
                errors = diagnostics.error_count(),
                "decoded with field errors"
            );
        }
        Ok(Outcome { state, diagnostics })
    }

    /// Look up an existing object from identifying attributes.
    ///
    /// Singletons are read from their endpoint directly.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, when no lookup group is satisfied,
    /// on transport errors, and when a search matches zero or several
    /// objects.
    pub async fn read_data_source(&self, ctx: &CallContext, config: &AttributeSet) -> OperationResult<Outcome> {
        let ctx = ctx.clone().with_source(Source::DataSource).with_callee(Callee::Read);
        let base = self.schema.endpoint;

        self.check(Callee::Read, base, &self.schema.validate_config(config))?;
        let resolved = if self.schema.singleton {
            ResolvedEndpoint {
                group: "singleton",
                style: LookupStyle::Path,
                endpoint: base.to_string(),
            }
        } else {
            resolve(base, &self.schema.lookup_groups, config).map_err(|e| self.fail(Callee::Read, base, e))?
        };
        debug!(type_name = self.schema.type_name, group = resolved.group, endpoint = %resolved.endpoint, "resolved lookup");

        let object = self.send(Callee::Read, Method::GET, &resolved.endpoint, None).await?;
        let object = match resolved.style {
            LookupStyle::Query => {
                envelope::unwrap(object).map_err(|e| self.fail(Callee::Read, &resolved.endpoint, e))?
            }
            LookupStyle::Path => object,
        };

        self.finish(&ctx, &resolved.endpoint, &object, Some(config))
    }

    /// Create an object from a plan.
    ///
    /// Singletons are written in place with the schema's update method.
    ///
    /// # Errors
    ///
    /// Fails on invalid plans, encoding errors, transport errors and hook
    /// errors.
    pub async fn create(&self, ctx: &CallContext, plan: &AttributeSet) -> OperationResult<Outcome> {
        let ctx = ctx.clone().with_source(Source::Resource).with_callee(Callee::Create);
        let endpoint = self.schema.endpoint;

        self.check(Callee::Create, endpoint, &self.schema.validate_create(plan))?;
        let body = encode_body(&self.schema, plan).map_err(|e| self.fail(Callee::Create, endpoint, e))?;

        let method = if self.schema.singleton {
            self.schema.update_method.method()
        } else {
            Method::POST
        };
        let object = self.send(Callee::Create, method, endpoint, Some(body)).await?;
        let outcome = self.finish(&ctx, endpoint, &object, Some(plan))?;

        info!(
            type_name = self.schema.type_name,
            id = ?self.schema.id_of(&outcome.state),
            "created object"
        );
        Ok(outcome)
    }

    /// Refresh stored state from the server.
    ///
    /// Returns `Ok(None)` when the object no longer exists.
    ///
    /// # Errors
    ///
    /// Fails when the stored id is unknown, on transport errors other than
    /// 404, and on hook errors.
    pub async fn read(&self, ctx: &CallContext, state: &AttributeSet) -> OperationResult<Option<Outcome>> {
        let ctx = ctx.clone().with_source(Source::Resource).with_callee(Callee::Read);
        let endpoint = self.object_endpoint(Callee::Read, state)?;

        match self.transport.request(Method::GET, &endpoint, None).await {
            Ok(object) => self.finish(&ctx, &endpoint, &object, Some(state)).map(Some),
            Err(e) if e.is_not_found() => {
                info!(type_name = self.schema.type_name, endpoint = %endpoint, "object no longer exists");
                Ok(None)
            }
            Err(e) => Err(self.fail(Callee::Read, endpoint, e)),
        }
    }

    /// Apply a plan to an existing object.
    ///
    /// The id is taken from `prior`, falling back to the plan.
    ///
    /// # Errors
    ///
    /// Fails on an unknown id, encoding errors, transport errors and hook
    /// errors.
    pub async fn update(
        &self,
        ctx: &CallContext,
        plan: &AttributeSet,
        prior: &AttributeSet,
    ) -> OperationResult<Outcome> {
        let ctx = ctx.clone().with_source(Source::Resource).with_callee(Callee::Update);
        let endpoint = match self.object_endpoint(Callee::Update, prior) {
            Ok(endpoint) => endpoint,
            Err(_) => self.object_endpoint(Callee::Update, plan)?,
        };

        let body = encode_body(&self.schema, plan).map_err(|e| self.fail(Callee::Update, &endpoint, e))?;

        let method = self.schema.update_method.method();
        let object = self.send(Callee::Update, method, &endpoint, Some(body)).await?;
        self.finish(&ctx, &endpoint, &object, Some(plan))
    }

    /// Delete an object. An object that is already gone counts as deleted.
    ///
    /// Singletons only exist as long as the server does, so nothing is sent.
    ///
    /// # Errors
    ///
    /// Fails when the stored id is unknown and on transport errors other
    /// than 404.
    pub async fn delete(&self, ctx: &CallContext, state: &AttributeSet) -> OperationResult<()> {
        let ctx = ctx.clone().with_source(Source::Resource).with_callee(Callee::Delete);
        if self.schema.singleton {
            debug!(type_name = self.schema.type_name, "singleton is not deleted remotely");
            return Ok(());
        }

        let endpoint = self.object_endpoint(ctx.callee, state)?;
        match self.transport.request(Method::DELETE, &endpoint, None).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                info!(type_name = self.schema.type_name, endpoint = %endpoint, "object already deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(Callee::Delete, endpoint, e)),
        }
    }
}
