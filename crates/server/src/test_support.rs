use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use db::{
    DBService,
    models::{
        company::{Company, Home},
        form_blueprint::{BlueprintStatus, CreateFormBlueprint, FormBlueprint, FormHead},
        role_membership::{CreateRoleMembership, Role, RoleMembership},
        young_person::{CreateYoungPerson, YoungPerson},
    },
};
use http_body_util::BodyExt;
use serde_json::Value;
use services::services::auth::Authenticator;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, app};

const SECRET: &str = "test-secret";

/// A router over an in-memory database seeded with one company, one young
/// person and a published plus an unpublished blueprint.
pub struct TestApp {
    pub db: DBService,
    pub router: Router,
    pub company_id: Uuid,
    pub person_id: Uuid,
    pub blueprint_id: Uuid,
    pub unpublished_blueprint_id: Uuid,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = DBService::new_in_memory().await.unwrap();
        let company = Company::create(&db.pool, "Acme Care").await.unwrap();
        let home = Home::create(&db.pool, company.id, "Oak House").await.unwrap();
        let person = YoungPerson::create(
            &db.pool,
            &CreateYoungPerson {
                company_id: company.id,
                home_id: Some(home.id),
                name: "Sam".to_string(),
            },
        )
        .await
        .unwrap();
        let mut blueprints = Vec::new();
        for status in [BlueprintStatus::Published, BlueprintStatus::Draft] {
            let blueprint = FormBlueprint::create(
                &db.pool,
                &CreateFormBlueprint {
                    company_id: company.id,
                    head: FormHead::YoungPeople,
                    name: "Daily log".to_string(),
                    status: Some(status),
                    form_type: None,
                },
            )
            .await
            .unwrap();
            blueprints.push(blueprint.id);
        }

        let router = app(AppState::new(db.clone(), Authenticator::new(SECRET)));
        Self {
            db,
            router,
            company_id: company.id,
            person_id: person.id,
            blueprint_id: blueprints[0],
            unpublished_blueprint_id: blueprints[1],
        }
    }

    /// Create a user with `role` in the seeded company and return a bearer token for them.
    pub async fn token_for(&self, role: Role, company_id: Option<Uuid>) -> String {
        let user_id = Uuid::new_v4();
        RoleMembership::create(
            &self.db.pool,
            &CreateRoleMembership {
                user_id,
                role,
                company_id,
                home_id: None,
            },
        )
        .await
        .unwrap();
        utils::jwt::issue(SECRET, user_id, Duration::minutes(5)).unwrap()
    }

    pub async fn staff_token(&self) -> String {
        self.token_for(Role::Staff, Some(self.company_id)).await
    }

    pub async fn manager_token(&self) -> String {
        self.token_for(Role::Manager, Some(self.company_id)).await
    }

    pub async fn start_entry(&self, token: &str) -> String {
        let (status, body) = self
            .post(
                "/api/forms/start",
                Some(token),
                serde_json::json!({"youngPersonId": self.person_id, "blueprintId": self.blueprint_id}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["entryId"].as_str().unwrap().to_string()
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::get(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}
