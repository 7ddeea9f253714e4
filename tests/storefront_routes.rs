use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{
        Request, Response, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use http_body_util::BodyExt;
use serde_json::Value;
use storefront::{
    app,
    app_state::AppState,
    auth,
    config::MessagingConfig,
    models::CreateProductEntity,
    repositories::{
        MemoryOrderRepository, MemoryProductRepository, MemoryUserRepository, OrderRepository,
        ProductRepository,
    },
    session::{MemorySessionStore, SESSION_COOKIE},
    uploads::LocalImageStore,
};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    products: Arc<MemoryProductRepository>,
    orders: Arc<MemoryOrderRepository>,
    sessions: Arc<MemorySessionStore>,
    uploads: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let uploads = tempfile::tempdir().expect("temp upload dir");
        let products = Arc::new(MemoryProductRepository::new());
        let orders = Arc::new(MemoryOrderRepository::new());
        let users = Arc::new(MemoryUserRepository::new());
        let sessions = Arc::new(MemorySessionStore::new());

        auth::ensure_admin(users.as_ref(), "admin", "secret")
            .await
            .expect("seed admin");

        let state = AppState {
            products: products.clone(),
            orders: orders.clone(),
            users,
            sessions: sessions.clone(),
            images: Arc::new(LocalImageStore::new(uploads.path())),
            messaging: Arc::new(MessagingConfig::default()),
        };

        Self {
            router: app(state, uploads.path()),
            products,
            orders,
            sessions,
            uploads,
        }
    }

    async fn seed_shirt(&self) -> i32 {
        self.products
            .create(
                CreateProductEntity {
                    name: "Shirt".into(),
                    description: "Cotton shirt".into(),
                    price: 10.0,
                },
                vec!["shirt_red.png".into(), "shirt_blue.png".into()],
            )
            .await
            .expect("seed product")
            .product
            .id
    }

    fn browser(&self) -> Browser {
        Browser {
            router: self.router.clone(),
            cookie: None,
        }
    }

    fn browser_with_cookie(&self, cookie: &str) -> Browser {
        Browser {
            router: self.router.clone(),
            cookie: Some(cookie.to_string()),
        }
    }
}

/// Sends requests and carries the session cookie between them.
struct Browser {
    router: Router,
    cookie: Option<String>,
}

impl Browser {
    async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response<Body> {
        let builder = match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response");

        if let Some(cookie) = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with(SESSION_COOKIE))
        {
            self.cookie = cookie.split(';').next().map(str::to_string);
        }

        response
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri), Body::empty()).await
    }

    async fn post(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::builder().method("POST").uri(uri), Body::empty())
            .await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(form.to_string()),
        )
        .await
    }

    async fn post_multipart(&mut self, uri: &str, boundary: &str, body: String) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary)),
            Body::from(body),
        )
        .await
    }

    async fn login(&mut self) {
        let response = self
            .post_form("/login", "username=admin&password=secret")
            .await;
        assert_eq!(location(&response), "/admin");
    }
}

async fn json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> String {
    parts
        .iter()
        .map(|(name, filename, value)| {
            let disposition = match filename {
                Some(filename) => format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream",
                    name, filename
                ),
                None => format!("Content-Disposition: form-data; name=\"{}\"", name),
            };
            format!("--{}\r\n{}\r\n\r\n{}\r\n", boundary, disposition, value)
        })
        .collect::<String>()
        + &format!("--{}--\r\n", boundary)
}

fn location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_string()
}

#[tokio::test]
async fn catalog_lists_products_and_404s_unknown_ids() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    let body = json(browser.get("/").await).await;
    assert_eq!(body["data"][0]["product"]["name"], "Shirt");
    assert_eq!(body["data"][0]["images"].as_array().unwrap().len(), 2);

    let response = browser.get(&format!("/product/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = browser.get("/product/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adding_the_same_line_twice_merges_quantities() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    let uri = format!("/cart/add/{}", id);
    let response = browser.post_form(&uri, "size=M&quantity=2&color=red").await;
    assert_eq!(location(&response), "/cart");
    browser.post_form(&uri, "size=M&quantity=3&color=red").await;

    let body = json(browser.get("/cart").await).await;
    let cart = body["data"]["cart"].as_array().unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["quantity"], 5);
    assert_eq!(cart[0]["total_price"], 50.0);
    assert_eq!(cart[0]["image"], "shirt_red.png");
    assert_eq!(body["data"]["total_cost"], 50.0);
}

#[tokio::test]
async fn different_colors_are_separate_lines_and_remove_is_exact() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    let uri = format!("/cart/add/{}", id);
    browser.post_form(&uri, "size=M&quantity=1&color=red").await;
    browser.post_form(&uri, "size=M&quantity=1&color=blue").await;

    let body = json(browser.get("/cart").await).await;
    assert_eq!(body["data"]["cart"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_cost"], 20.0);

    let response = browser.post(&format!("/cart/remove/{}/M/red", id)).await;
    assert_eq!(location(&response), "/cart");

    let body = json(browser.get("/cart").await).await;
    let cart = body["data"]["cart"].as_array().unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0]["color"], "blue");
}

#[tokio::test]
async fn kids_size_is_used_when_size_is_empty() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    browser
        .post_form(
            &format!("/cart/add/{}", id),
            "size=&size_kids=8Y&quantity=1&color=red",
        )
        .await;

    let body = json(browser.get("/cart").await).await;
    assert_eq!(body["data"]["cart"][0]["size"], "8Y");
}

#[tokio::test]
async fn bad_add_requests_leave_the_cart_unchanged() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    let response = browser
        .post_form(&format!("/cart/add/{}", id), "size=M&quantity=1&color=green")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = browser
        .post_form("/cart/add/999", "size=M&quantity=1&color=red")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json(browser.get("/cart").await).await;
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn checkout_persists_order_clears_cart_and_links_the_new_order() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    browser
        .post_form(&format!("/cart/add/{}", id), "size=M&quantity=2&color=red")
        .await;

    let response = browser.post("/checkout").await;
    assert_eq!(location(&response), "/submit");
    assert_eq!(app.orders.count().await, 1);

    let order = app.orders.find(1).await.unwrap().unwrap();
    assert_eq!(order.order.total, 20.0);
    assert_eq!(order.order_items.len(), 1);
    assert_eq!(order.order_items[0].product_name, "Shirt");
    assert_eq!(order.order_items[0].rate, 10.0);
    assert_eq!(order.order_items[0].quantity, 2);
    assert_eq!(order.order_items[0].size, "M");
    assert_eq!(order.order_items[0].color, "red");

    let body = json(browser.get("/cart").await).await;
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["total_cost"], 0.0);

    let response = browser.get("/submit").await;
    let link = url::Url::parse(&location(&response)).unwrap();
    assert_eq!(link.host_str(), Some("wa.me"));
    let text = link
        .query_pairs()
        .find(|(key, _)| key == "text")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    assert!(text.ends_with("/admin/order/1"), "unexpected text {}", text);
}

#[tokio::test]
async fn empty_checkout_and_submit_without_order_are_rejected() {
    let app = TestApp::new().await;
    let mut browser = app.browser();

    let response = browser.post("/checkout").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.orders.count().await, 0);

    let response = browser.get("/submit").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_routes_redirect_anonymous_visitors_to_login() {
    let app = TestApp::new().await;
    let mut browser = app.browser();

    for uri in ["/admin", "/admin/add", "/admin/order/1", "/logout"] {
        let response = browser.get(uri).await;
        assert_eq!(location(&response), "/login", "{} should be protected", uri);
    }

    let body = json(browser.get("/login").await).await;
    assert_eq!(
        body["data"]["flashes"][0]["message"],
        "Please log in to access this page."
    );
}

#[tokio::test]
async fn login_grants_admin_access_until_logout() {
    let app = TestApp::new().await;
    let mut browser = app.browser();

    let response = browser
        .post_form("/login", "username=admin&password=wrong")
        .await;
    assert_eq!(location(&response), "/login");
    let body = json(browser.get("/login").await).await;
    assert_eq!(
        body["data"]["flashes"][0]["message"],
        "Invalid username or password."
    );

    browser.login().await;
    let response = browser.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["data"]["flashes"][0]["message"], "Logged in successfully.");

    let response = browser.get("/logout").await;
    assert_eq!(location(&response), "/login");
    let response = browser.get("/admin").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn create_product_skips_disallowed_uploads() {
    let app = TestApp::new().await;
    let mut browser = app.browser();
    browser.login().await;

    let boundary = "storefront-boundary";
    let body = multipart_body(
        boundary,
        &[
            ("name", None, "Hoodie"),
            ("description", None, "Warm hoodie"),
            ("price", None, "25.5"),
            ("images", Some("hoodie black.png"), "png-bytes"),
            ("images", Some("virus.exe"), "exe-bytes"),
        ],
    );

    let response = browser.post_multipart("/admin/add", boundary, body).await;
    assert_eq!(location(&response), "/admin");

    let products = app.products.list().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product.name, "Hoodie");
    assert_eq!(products[0].product.price, 25.5);
    assert_eq!(products[0].images.len(), 1);
    assert_eq!(products[0].images[0].image_filename, "hoodie_black.png");

    let stored = std::fs::read(app.uploads.path().join("hoodie_black.png")).unwrap();
    assert_eq!(stored, b"png-bytes");
    assert!(!app.uploads.path().join("virus.exe").exists());

    let response = browser.get("/static/uploads/hoodie_black.png").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn edit_updates_scalars_only() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();
    browser.login().await;

    let uri = format!("/admin/edit/{}", id);
    let body = json(browser.get(&uri).await).await;
    assert_eq!(body["data"]["product"]["name"], "Shirt");

    let response = browser
        .post_form(&uri, "name=Polo&description=Pique+polo&price=12.5")
        .await;
    assert_eq!(location(&response), "/admin");

    let product = app.products.find(id).await.unwrap().unwrap();
    assert_eq!(product.product.name, "Polo");
    assert_eq!(product.product.description, "Pique polo");
    assert_eq!(product.product.price, 12.5);
    assert_eq!(product.images.len(), 2);

    let response = browser
        .post_form("/admin/edit/999", "name=Ghost&description=None&price=1")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_product_keeps_existing_orders_intact() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;

    let mut shopper = app.browser();
    shopper
        .post_form(&format!("/cart/add/{}", id), "size=L&quantity=1&color=blue")
        .await;
    shopper.post("/checkout").await;

    let mut admin = app.browser();
    admin.login().await;

    let response = admin.get(&format!("/admin/delete_product/{}", id)).await;
    assert_eq!(location(&response), "/admin");
    assert!(app.products.find(id).await.unwrap().is_none());

    let body = json(admin.get("/admin").await).await;
    assert!(body["data"]["products"].as_array().unwrap().is_empty());
    let flashes: Vec<&str> = body["data"]["flashes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|flash| flash["message"].as_str())
        .collect();
    assert!(flashes.contains(&"Product and associated images deleted successfully."));

    let body = json(admin.get("/admin/order/1").await).await;
    assert_eq!(body["data"]["order"]["total"], 10.0);
    assert_eq!(body["data"]["order_items"][0]["product_name"], "Shirt");
    assert_eq!(
        body["data"]["order_items"][0]["image_filename"],
        "shirt_blue.png"
    );

    let response = admin.get(&format!("/admin/delete_product/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = admin.get("/admin/order/42").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn colors_wider_than_the_order_column_are_rejected_at_add_time() {
    let app = TestApp::new().await;
    let id = app
        .products
        .create(
            CreateProductEntity {
                name: "Tee".into(),
                description: "Plain tee".into(),
                price: 8.0,
            },
            vec!["tee_light-green.png".into()],
        )
        .await
        .unwrap()
        .product
        .id;
    let mut browser = app.browser();

    let response = browser
        .post_form(
            &format!("/cart/add/{}", id),
            "size=M&quantity=1&color=light-green",
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json(browser.get("/cart").await).await;
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn merged_quantity_overflow_is_rejected() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    let uri = format!("/cart/add/{}", id);
    browser
        .post_form(&uri, "size=M&quantity=2000000000&color=red")
        .await;
    let response = browser
        .post_form(&uri, "size=M&quantity=2000000000&color=red")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json(browser.get("/cart").await).await;
    assert_eq!(body["data"]["cart"][0]["quantity"], 2_000_000_000);
}

#[tokio::test]
async fn product_names_wider_than_the_column_are_rejected_without_writing_files() {
    let app = TestApp::new().await;
    let mut browser = app.browser();
    browser.login().await;

    let boundary = "storefront-boundary";
    let long_name = "n".repeat(31);
    let body = multipart_body(
        boundary,
        &[
            ("name", None, long_name.as_str()),
            ("description", None, "Warm hoodie"),
            ("price", None, "25.5"),
            ("images", Some("hoodie.png"), "png-bytes"),
        ],
    );

    let response = browser.post_multipart("/admin/add", boundary, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.products.list().await.unwrap().is_empty());
    assert!(!app.uploads.path().join("hoodie.png").exists());

    let id = app.seed_shirt().await;
    let response = browser
        .post_form(
            &format!("/admin/edit/{}", id),
            &format!("name={}&description=Polo&price=1", long_name),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        app.products.find(id).await.unwrap().unwrap().product.name,
        "Shirt"
    );
}

#[tokio::test]
async fn login_moves_the_visitor_to_a_new_session_id() {
    let app = TestApp::new().await;
    let id = app.seed_shirt().await;
    let mut browser = app.browser();

    browser
        .post_form(&format!("/cart/add/{}", id), "size=M&quantity=1&color=red")
        .await;
    let before_login = browser.cookie.clone().expect("session cookie");

    browser.login().await;
    let after_login = browser.cookie.clone().expect("session cookie");
    assert_ne!(before_login, after_login);

    let body = json(browser.get("/cart").await).await;
    assert_eq!(body["data"]["cart"].as_array().unwrap().len(), 1);
    let response = browser.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut planted = app.browser_with_cookie(&before_login);
    let response = planted.get("/admin").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn anonymous_visits_leave_no_session_behind() {
    let app = TestApp::new().await;
    app.seed_shirt().await;

    for _ in 0..3 {
        let mut browser = app.browser();
        browser.get("/").await;
        let response = browser.get("/login").await;
        assert!(response.headers().get(SET_COOKIE).is_none());
        browser.get("/cart").await;
    }

    assert!(app.sessions.is_empty().await);
}
