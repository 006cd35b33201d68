//! Test Helpers

use std::sync::{Arc, Mutex};

use storefront::prelude::DeliveryMethod;
use tracing::{
    Subscriber,
    span::{Attributes, Id},
};
use tracing_subscriber::layer::{Context, Layer};

use crate::{
    domain::{
        orders::{
            data::NewOrder,
            records::{Address, OrderLine},
        },
        products::{
            ProductsService, ProductsServiceError,
            data::NewProduct,
            records::{ProductRecord, ProductUuid},
        },
        reviews::{ReviewsService, ReviewsServiceError, data::NewReview, records::ReviewRecord},
    },
    test::TestContext,
};

/// Two lines: 2 x 1999 and 1 x 499, no tax or discount.
pub(crate) fn new_order(user: &str) -> NewOrder {
    NewOrder {
        user_id: user.to_string(),
        items: vec![
            OrderLine {
                product_uuid: ProductUuid::new(),
                name: "Netflix Premium (1 month)".to_string(),
                unit_price: 1_999,
                quantity: 2,
                image: Some("netflix.png".to_string()),
            },
            OrderLine {
                product_uuid: ProductUuid::new(),
                name: "Steam Gift Card".to_string(),
                unit_price: 499,
                quantity: 1,
                image: None,
            },
        ],
        tax: 0,
        discount: 0,
        currency: "usd".to_string(),
        payment_method: "card".to_string(),
        billing_address: Address {
            name: "Ada Lovelace".to_string(),
            line1: "12 Analytical Row".to_string(),
            line2: None,
            city: "London".to_string(),
            state: "Greater London".to_string(),
            postal_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        },
        delivery_method: DeliveryMethod::Email,
        delivery_email: "ada@example.com".to_string(),
        notes: None,
    }
}

impl<S> TestContext<S> {
    pub(crate) async fn create_product(
        &self,
        name: &str,
        price: u64,
    ) -> Result<ProductRecord, ProductsServiceError> {
        self.products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: name.to_string(),
                price,
            })
            .await
    }

    pub(crate) async fn add_review(
        &self,
        user: &str,
        product: ProductUuid,
        rating: i64,
    ) -> Result<ReviewRecord, ReviewsServiceError> {
        self.reviews
            .add_review(NewReview {
                user_id: user.to_string(),
                product_uuid: product,
                rating,
                title: "Review".to_string(),
                content: format!("{rating} stars from {user}"),
            })
            .await
    }
}

/// Records the name of every span opened while installed.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

impl SpanNames {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.0
            .lock()
            .is_ok_and(|names| names.iter().any(|recorded| *recorded == name))
    }
}

impl<S: Subscriber> Layer<S> for SpanNames {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if let Ok(mut names) = self.0.lock() {
            names.push(attrs.metadata().name());
        }
    }
}
