use actix_identity::Identity;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tera::Context;

use crate::{db, errors::AppError, utils, validate, AppState, TEMPLATES};

/// Hardcoded worldwide-sales dataset backing the decorative chart page.
const SAMPLE_SALES: &[(&str, i64)] = &[
    ("Vicks", 15),
    ("Candida", 20),
    ("Paracetamol", 33),
    ("Miconazole 3", 10),
    ("Propanol Hydrochloride", 12),
];

fn page(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::Template(e)
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

fn redirect(to: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", to.to_string()))
        .finish()
}

/// The identity cookie stores the user id as a string; anything else
/// counts as anonymous.
fn current_user(identity: &Option<Identity>) -> Result<Option<i64>, AppError> {
    match identity {
        None => Ok(None),
        Some(identity) => Ok(identity.id()?.parse().ok()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn home_context() -> Context {
    let mut context = Context::new();
    context.insert("title", "Medical Inventory Management System");
    context.insert("login_error", "");
    context.insert("signup_error", "");
    context.insert("message", "");
    context
}

#[get("/")]
pub async fn index_handler(identity: Option<Identity>) -> Result<impl Responder, AppError> {
    if current_user(&identity)?.is_some() {
        return Ok(redirect("/dashboard"));
    }
    page("home.html", &home_context())
}

#[derive(Deserialize)]
pub struct SignupForm {
    pharmacy_name: String,
    username: String,
    email: String,
    password: String,
}

#[post("/signup")]
pub async fn signup_form_handler(
    web::Form(form): web::Form<SignupForm>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let mut context = home_context();

    let error = if form.pharmacy_name.is_empty()
        || form.username.is_empty()
        || form.email.is_empty()
        || form.password.is_empty()
    {
        Some("All fields are required".to_string())
    } else if !validate::valid_email(&form.email) {
        Some("Invalid email address".to_string())
    } else if db::username_exists(&state, &form.username).await? {
        Some("Username already exists. Please choose a different one.".to_string())
    } else if db::email_exists(&state, &form.email).await? {
        Some("Email address already registered.".to_string())
    } else if !validate::strong_password(&form.password) {
        Some(
            "Password should be at least 8 characters long and contain at least one uppercase letter and one digit."
                .to_string(),
        )
    } else {
        None
    };

    if let Some(error) = error {
        context.insert("signup_error", &error);
        return page("home.html", &context);
    }

    match db::create_user(&state, &form.pharmacy_name, &form.username, &form.email, &form.password)
        .await
    {
        Ok(_) => {
            context.insert("message", "Account created successfully. You can now log in.");
            page("home.html", &context)
        }
        // two sign-ups can pass the pre-checks at the same time; the
        // UNIQUE constraint decides and the loser sees the duplicate message
        Err(AppError::Constraint(_)) => {
            context.insert("signup_error", "Username or email already registered.");
            page("home.html", &context)
        }
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[post("/login")]
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    match db::authenticate(&state, &form.username, &form.password).await? {
        Some((user_id, _)) => {
            Identity::login(&request.extensions(), user_id.to_string())?;
            Ok(redirect("/dashboard"))
        }
        None => {
            log::warn!("Failed login attempt for {:?}", form.username);
            let mut context = home_context();
            context.insert("login_error", "Invalid username or password");
            page("home.html", &context)
        }
    }
}

#[post("/logout")]
pub async fn logout_handler(identity: Identity) -> impl Responder {
    identity.logout();
    redirect("/")
}

#[get("/dashboard")]
pub async fn dashboard_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(user_id) = current_user(&identity)? else {
        return Ok(redirect("/"));
    };

    let user = db::user_by_id(&state, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let today = today();
    let expiring = db::expiring_products(&state, user_id, today, db::EXPIRY_WINDOW_DAYS).await?;
    let low_stock = db::low_stock_products(&state, user_id, db::LOW_STOCK_THRESHOLD).await?;

    let mut context = Context::new();
    context.insert("title", "Home");
    context.insert("pharmacy_name", &user.pharmacy_name);
    context.insert("expiring", &expiring);
    context.insert("low_stock", &low_stock);

    page("dashboard.html", &context)
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

#[get("/products")]
pub async fn products_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, AppError> {
    let Some(user_id) = current_user(&identity)? else {
        return Ok(redirect("/"));
    };

    let search = query.q.clone().unwrap_or_default();
    let products = if search.is_empty() {
        db::list_products(&state, user_id).await?
    } else {
        db::search_products(&state, user_id, &search).await?
    };

    let today = today();
    let expiring = db::expiring_products(&state, user_id, today, db::EXPIRY_WINDOW_DAYS).await?;
    let low_stock = db::low_stock_products(&state, user_id, db::LOW_STOCK_THRESHOLD).await?;

    let mut context = Context::new();
    context.insert("title", "View Products");
    context.insert("products", &products);
    context.insert("search", &search);
    context.insert("expiring", &expiring);
    context.insert("low_stock", &low_stock);

    page("products.html", &context)
}

#[derive(Deserialize)]
pub struct AddProductForm {
    name: String,
    expiry_date: String,
    quantity: i64,
    amount: f64,
}

#[post("/products")]
pub async fn add_product_form_handler(
    web::Form(form): web::Form<AddProductForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(user_id) = current_user(&identity)? else {
        return Ok(redirect("/"));
    };

    if form.name.is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    let expiry_date: NaiveDate = form.expiry_date.parse().map_err(|_| {
        AppError::Validation("Expiry date must be a valid date (YYYY-MM-DD)".to_string())
    })?;

    db::add_product(&state, user_id, &form.name, expiry_date, form.quantity, form.amount).await?;

    Ok(redirect("/products"))
}

#[derive(Deserialize)]
pub struct RemoveProductForm {
    name: String,
}

/// Removal matches on name alone, across every pharmacy.
#[post("/products/remove")]
pub async fn remove_product_form_handler(
    web::Form(form): web::Form<RemoveProductForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    if current_user(&identity)?.is_none() {
        return Ok(redirect("/"));
    }

    if form.name.is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    db::remove_product_by_name(&state, &form.name).await?;

    Ok(redirect("/products"))
}

#[derive(Deserialize)]
pub struct SalesQuery {
    date: Option<String>,
}

#[get("/sales")]
pub async fn sales_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
    query: web::Query<SalesQuery>,
) -> Result<impl Responder, AppError> {
    if current_user(&identity)?.is_none() {
        return Ok(redirect("/"));
    }

    let selected_date = match query.date.as_deref() {
        Some(s) if !s.is_empty() => s.parse().map_err(|_| {
            AppError::Validation("Date must be a valid date (YYYY-MM-DD)".to_string())
        })?,
        _ => today(),
    };
    let sales = db::find_sales_by_date(&state, selected_date).await?;

    let mut context = Context::new();
    context.insert("title", "Sales");
    context.insert("sales", &sales);
    context.insert("selected_date", &selected_date);

    page("sales.html", &context)
}

#[derive(Deserialize)]
pub struct RecordSaleForm {
    customer_name: String,
    mobile_number: String,
    product_name: String,
    quantity: i64,
    amount: f64,
    sale_date: String,
}

#[post("/sales")]
pub async fn record_sale_form_handler(
    web::Form(form): web::Form<RecordSaleForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let Some(user_id) = current_user(&identity)? else {
        return Ok(redirect("/"));
    };

    if form.customer_name.is_empty() || form.product_name.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    if !validate::valid_mobile(&form.mobile_number) {
        return Err(AppError::Validation(
            "Mobile number should be exactly 10 digits.".to_string(),
        ));
    }
    let sale_date: NaiveDate = form.sale_date.parse().map_err(|_| {
        AppError::Validation("Sale date must be a valid date (YYYY-MM-DD)".to_string())
    })?;
    if !validate::sale_date_ok(sale_date, today()) {
        return Err(AppError::Validation(
            "Sale date cannot be ahead of today's date.".to_string(),
        ));
    }

    // the sale is entered by medicine name; resolve it within the acting
    // user's own inventory
    let product_id = db::product_id_by_name(&state, user_id, &form.product_name)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    db::record_sale(
        &state,
        &form.customer_name,
        &form.mobile_number,
        product_id,
        form.quantity,
        form.amount,
        sale_date,
    )
    .await?;

    Ok(redirect(&format!("/sales?date={}", sale_date)))
}

#[get("/sales/{id}/invoice")]
pub async fn invoice_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    if current_user(&identity)?.is_none() {
        return Ok(redirect("/"));
    }

    let sale_id = path.into_inner();
    let sale = db::find_sale_by_id(&state, sale_id)
        .await?
        .ok_or(AppError::NotFound("sale"))?;
    let product_name = db::resolve_product_name(&state, sale.product_id).await?;

    let mut context = Context::new();
    context.insert("sale", &sale);
    context.insert("product_name", &product_name);

    let rendered = TEMPLATES.render("invoice.html", &context).map_err(|e| {
        log::error!("Failed to render invoice for sale {}: {}", sale_id, e);
        AppError::Template(e)
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .append_header((
            "Content-Disposition",
            format!("attachment; filename=\"invoice_{}.html\"", sale_id),
        ))
        .body(rendered))
}

#[get("/chart")]
pub async fn chart_handler(identity: Option<Identity>) -> Result<impl Responder, AppError> {
    if current_user(&identity)?.is_none() {
        return Ok(redirect("/"));
    }

    let slices = utils::pie_slices(SAMPLE_SALES, 160.0, 160.0, 140.0);

    let mut context = Context::new();
    context.insert("title", "Total Sales by Medicine");
    context.insert("slices", &slices);

    page("chart.html", &context)
}
