//! Service facade
//!
//! The operations a transport layer exposes, each taking a `RequestContext`
//! and answering with an `Envelope`. Every call runs inside a tracing span
//! carrying the request's correlation id, and every failure is reported as
//! an error kind plus a message instead of being raised.

use crate::catalog::{
    CatalogStore, Filter, FilterOptions, Page, Paging, QueryEngine, RawFilter,
};
use crate::config::ServiceConfig;
use crate::core::{CardDef, CardId, DuelId, PlayerId};
use crate::deck::{DeckIds, DeckSpec, DeckStats, DeckValidator, ValidationReport};
use crate::game::{Action, DuelView};
use crate::session::{NewDuel, SessionRegistry, SubmitOutcome};
use crate::{ErrorKind, Result, TcgError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated caller, established by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: PlayerId,
}

/// Per-request context: correlation id and optional auth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub auth: Option<AuthContext>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            auth: None,
        }
    }

    pub fn for_user(user_id: impl Into<PlayerId>) -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            auth: Some(AuthContext {
                user_id: user_id.into(),
            }),
        }
    }

    /// The caller, or a validation error for unauthenticated requests
    pub fn user(&self) -> Result<&PlayerId> {
        self.auth
            .as_ref()
            .map(|a| &a.user_id)
            .ok_or_else(|| TcgError::InvalidPayload("request is not authenticated".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&TcgError> for ApiError {
    fn from(err: &TcgError) -> Self {
        ApiError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Response wrapper with stable field names
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub request_id: Uuid,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> Envelope<T> {
    fn from_result(ctx: &RequestContext, result: Result<T>) -> Self {
        match result {
            Ok(data) => Envelope {
                request_id: ctx.request_id,
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(err) => {
                tracing::warn!(kind = %err.kind(), error = %err, "request failed");
                Envelope {
                    request_id: ctx.request_id,
                    ok: false,
                    data: None,
                    error: Some(ApiError::from(&err)),
                }
            }
        }
    }

    pub fn into_result(self) -> std::result::Result<T, ApiError> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(err)) => Err(err),
            (None, None) => Err(ApiError {
                kind: ErrorKind::Internal,
                message: "empty response".to_string(),
            }),
        }
    }
}

/// Body of `duel.create`; the caller takes seat 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDuelRequest {
    pub opponent: PlayerId,
    pub deck: DeckIds,
    pub opponent_deck: DeckIds,
    #[serde(default)]
    pub first_player: Option<usize>,
    #[serde(default)]
    pub duel_id: Option<DuelId>,
}

pub struct TcgService {
    catalog: Arc<CatalogStore>,
    sessions: SessionRegistry,
    config: ServiceConfig,
}

impl TcgService {
    pub fn new(catalog: Arc<CatalogStore>, config: ServiceConfig) -> Self {
        TcgService {
            sessions: SessionRegistry::new(config.engine.clone(), config.seed),
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    fn run<T>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        f: impl FnOnce() -> Result<T>,
    ) -> Envelope<T> {
        let span = tracing::info_span!("request", request_id = %ctx.request_id, operation);
        let _enter = span.enter();
        Envelope::from_result(ctx, f())
    }

    fn resolve_deck(&self, deck: &DeckIds) -> Result<DeckSpec> {
        deck.resolve(&self.catalog.snapshot())
    }

    pub fn catalog_query(
        &self,
        ctx: &RequestContext,
        filter: RawFilter,
        page: usize,
        per_page: usize,
    ) -> Envelope<Page<Arc<CardDef>>> {
        self.run(ctx, "catalog.query", || {
            let filter = Filter::try_from(filter)?;
            let per_page = if per_page == 0 {
                self.config.default_per_page
            } else {
                per_page
            };
            let snapshot = self.catalog.snapshot();
            let engine = QueryEngine::new(&snapshot).with_max_per_page(self.config.max_per_page);
            Ok(engine.query(&filter, Paging::new(page, per_page)))
        })
    }

    pub fn catalog_by_id(&self, ctx: &RequestContext, id: &CardId) -> Envelope<Arc<CardDef>> {
        self.run(ctx, "catalog.by_id", || self.catalog.by_id(id))
    }

    pub fn catalog_random(
        &self,
        ctx: &RequestContext,
        filter: RawFilter,
        k: usize,
    ) -> Envelope<Vec<Arc<CardDef>>> {
        self.run(ctx, "catalog.random", || {
            let filter = Filter::try_from(filter)?;
            let snapshot = self.catalog.snapshot();
            Ok(QueryEngine::new(&snapshot).random(&filter, k, &mut rand::thread_rng()))
        })
    }

    pub fn filter_options(&self, ctx: &RequestContext) -> Envelope<FilterOptions> {
        self.run(ctx, "catalog.filter_options", || {
            Ok(QueryEngine::new(&self.catalog.snapshot()).filter_options())
        })
    }

    /// Validation always yields a report; only unknown card ids fail
    pub fn deck_validate(&self, ctx: &RequestContext, deck: &DeckIds) -> Envelope<ValidationReport> {
        self.run(ctx, "deck.validate", || {
            Ok(DeckValidator::validate(&self.resolve_deck(deck)?))
        })
    }

    pub fn deck_stats(&self, ctx: &RequestContext, deck: &DeckIds) -> Envelope<DeckStats> {
        self.run(ctx, "deck.stats", || {
            Ok(DeckValidator::stats(&self.resolve_deck(deck)?))
        })
    }

    pub fn duel_create(&self, ctx: &RequestContext, request: CreateDuelRequest) -> Envelope<DuelId> {
        self.run(ctx, "duel.create", || {
            let user = ctx.user()?.clone();
            let decks = [
                self.resolve_deck(&request.deck)?,
                self.resolve_deck(&request.opponent_deck)?,
            ];
            self.sessions.create(NewDuel {
                seats: [user, request.opponent],
                decks,
                first_player: request.first_player,
                duel_id: request.duel_id,
            })
        })
    }

    pub fn duel_submit(
        &self,
        ctx: &RequestContext,
        duel_id: &DuelId,
        action: Action,
    ) -> Envelope<SubmitOutcome> {
        self.run(ctx, "duel.submit", || {
            let user = ctx.user()?;
            self.sessions.submit(duel_id, user, action)
        })
    }

    pub fn duel_view(&self, ctx: &RequestContext, duel_id: &DuelId) -> Envelope<DuelView> {
        self.run(ctx, "duel.view", || {
            self.sessions.view(duel_id, ctx.user()?)
        })
    }

    pub fn duel_forget(&self, ctx: &RequestContext, duel_id: &DuelId) -> Envelope<()> {
        self.run(ctx, "duel.forget", || {
            self.sessions.forget(duel_id, ctx.user()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ctx = RequestContext::anonymous();
        let ok: Envelope<u8> = Envelope::from_result(&ctx, Ok(3));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["data"], 3);
        assert!(json.get("error").is_none());

        let err: Envelope<u8> =
            Envelope::from_result(&ctx, Err(TcgError::DuelNotFound("x".to_string())));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["kind"], "not_found");
        assert_eq!(json["request_id"], ctx.request_id.to_string());
    }

    #[test]
    fn test_missing_auth_is_validation_error() {
        let service = TcgService::new(Arc::new(CatalogStore::new()), ServiceConfig::default());
        let ctx = RequestContext::anonymous();
        let response = service.duel_view(&ctx, &DuelId::new("duel-1"));
        let err = response.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_unknown_card_is_not_found() {
        let service = TcgService::new(Arc::new(CatalogStore::new()), ServiceConfig::default());
        let ctx = RequestContext::for_user("alice");
        let response = service.catalog_by_id(&ctx, &CardId::new("nope"));
        assert_eq!(response.into_result().unwrap_err().kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_bad_filter_is_validation_error() {
        let service = TcgService::new(Arc::new(CatalogStore::new()), ServiceConfig::default());
        let ctx = RequestContext::anonymous();
        let filter = RawFilter {
            element: Some("plasma".to_string()),
            ..RawFilter::default()
        };
        let response = service.catalog_query(&ctx, filter, 1, 20);
        assert_eq!(response.into_result().unwrap_err().kind, ErrorKind::Validation);
    }
}
