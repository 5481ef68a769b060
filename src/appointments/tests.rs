use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    app::build_app,
    properties::repo_types::NewProperty,
    testing::{body_json, fake_state, json_request},
};

#[tokio::test]
async fn booking_without_a_token_is_accepted() {
    let app = build_app(fake_state());
    let res = app
        .oneshot(json_request(
            Method::POST,
            "/api/appointment/addappointment",
            None,
            json!({
                "name": "Ravi",
                "email": "ravi@example.com",
                "mobile": "9123456780",
                "appointmentDate": "2024-05-01T10:30",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Appointment added successfully");
    assert_eq!(body["appointment"]["appointmentDate"], "2024-05-01T10:30");
    assert!(body["appointment"].get("user").is_none());
    assert!(body["appointment"]["propertyId"].is_null());
}

#[tokio::test]
async fn booking_links_user_and_property() {
    let state = fake_state();
    let app = build_app(state.clone());
    let owner = Uuid::new_v4();
    let listing = state
        .listings
        .create(NewProperty {
            user_id: owner,
            image: "/Property/x.jpg".into(),
            image_key: "Property/x.jpg".into(),
            name: "Flat".into(),
            kind: "Apartment".into(),
            categories: "Rent".into(),
            size: "800 sqft".into(),
            address: "1 Main St".into(),
            city: "Pune".into(),
            condition: "Good".into(),
        })
        .await
        .unwrap();

    let visitor = Uuid::new_v4();
    let token = state.user_tokens.issue(visitor, "Ravi").unwrap();
    let res = app
        .oneshot(json_request(
            Method::POST,
            "/api/appointment/addappointment",
            Some(token.as_str()),
            json!({
                "name": "Ravi",
                "email": "ravi@example.com",
                "mobile": "9123456780",
                "appointmentDate": "tomorrow 5pm",
                "propertyId": listing.id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["appointment"]["user"], visitor.to_string());
    assert_eq!(body["appointment"]["propertyId"], listing.id.to_string());
}

#[tokio::test]
async fn booking_input_errors() {
    let app = build_app(fake_state());

    let res = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/appointment/addappointment",
            None,
            json!({"name": "Ravi", "email": "ravi@example.com", "mobile": "9123456780"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "Please provide all fields");

    let res = app
        .oneshot(json_request(
            Method::POST,
            "/api/appointment/addappointment",
            None,
            json!({
                "name": "Ravi",
                "email": "ravi@example.com",
                "mobile": "9123456780",
                "appointmentDate": "2024-05-01",
                "propertyId": Uuid::new_v4(),
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
