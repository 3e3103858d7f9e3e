//! Request handlers.
//!
//! Handlers stay thin: they unpack the request, call the engine API for the caller's session and turn the result into
//! JSON. Privilege checks for staff routes are declared on the route (see [`route!`]) and repeated by the engine.
//!
//! Handlers run on the worker's thread. Anything slow (database, payment gateway) must be awaited, never blocked on.

use actix_web::{get, web, HttpResponse, Responder};
use box_office_engine::{
    db_types::{Event, EventId, Order, OrderId, OrderSource, PriceRule, Privilege, Product, ProductId},
    traits::{PaymentGateway, SessionProvider, TicketingDatabase},
    CatalogApi,
    OrderFlowApi,
    OrderLookup,
    SessionApi,
    TicketUsageApi,
    TicketUsageError,
};
use log::*;
use stripe_tools::StripeApi;

use crate::{
    data_objects::{
        IssuedSession,
        JsonResponse,
        NewSession,
        PriceListParams,
        TerminalConnection,
        UsageChange,
        UsageRecorded,
        UsageRefusal,
    },
    dto::NewProduct,
    errors::ServerError,
    middleware::Caller,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($privileges:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($privileges),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal requires [$($privileges:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($privileges),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Prices  ----------------------------------------------------
route!(price_list => Get "/prices" impl TicketingDatabase);
/// Prices for the online sales forms.
///
/// Products are listed in the `p` query parameter, comma-separated. A `coupon` may be given. Members' forms pass
/// `source=members`, which needs a session.
pub async fn price_list<B: TicketingDatabase>(
    caller: Caller,
    query: web::Query<PriceListParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ids = query.product_ids();
    let source = query.source.unwrap_or(OrderSource::Public);
    trace!("💻️ GET prices for {} product(s), {source}", ids.len());
    let prices = api.price_list(&ids, source, query.coupon.as_deref(), caller.session()).await?;
    Ok(HttpResponse::Ok().json(prices))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl TicketingDatabase, PaymentGateway);
/// Places an order.
///
/// Anyone may place a public order. Other sources need a session with the right privileges. A declined card comes
/// back with a 200 status and an `error` message for the buyer.
pub async fn place_order<B, G>(
    caller: Caller,
    body: web::Json<Order>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    let draft = body.into_inner();
    debug!("💻️ POST new {} order with {} line(s)", draft.source, draft.lines.len());
    let order = api.place_order(draft, caller.session()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(calculate_order => Post "/orders/calculate" impl TicketingDatabase, PaymentGateway);
pub async fn calculate_order<B, G>(
    caller: Caller,
    body: web::Json<Order>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    let order = api.calculate_order(body.into_inner(), caller.session()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_by_id => Get "/orders/{id}" impl TicketingDatabase, PaymentGateway where requires [Privilege::HandleOrders]);
pub async fn order_by_id<B, G>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    let id = OrderId(path.into_inner());
    trace!("💻️ GET order {id}");
    let order = api.fetch_order(id, caller.session()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(capture_order => Post "/orders/{id}/capture" impl TicketingDatabase, PaymentGateway where requires [Privilege::Sell]);
pub async fn capture_order<B, G>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    let id = OrderId(path.into_inner());
    debug!("💻️ POST capture payment for order {id}");
    let order = api.capture_order(id, caller.session()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Delete "/orders/{id}" impl TicketingDatabase, PaymentGateway where requires [Privilege::Sell]);
pub async fn cancel_order<B, G>(
    caller: Caller,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    let id = OrderId(path.into_inner());
    debug!("💻️ DELETE pending order {id}");
    api.cancel_order(id, caller.session()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {id} cancelled"))))
}

route!(tickets => Get "/tickets/{token}" impl TicketingDatabase, PaymentGateway);
/// The order behind a ticket token. Used by the printable ticket page.
pub async fn tickets<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: TicketingDatabase,
    G: PaymentGateway,
{
    let token = path.into_inner();
    let order = api.fetch_tickets(&token).await?.ok_or_else(|| ServerError::NoRecordFound("No such ticket".into()))?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Events  ----------------------------------------------------
route!(list_events => Get "/events" impl TicketingDatabase where requires [Privilege::Setup, Privilege::Sell, Privilege::Admit]);
pub async fn list_events<B: TicketingDatabase>(
    caller: Caller,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let events = api.list_events(caller.session()).await?;
    Ok(HttpResponse::Ok().json(events))
}

route!(create_event => Post "/events" impl TicketingDatabase where requires [Privilege::Setup]);
pub async fn create_event<B: TicketingDatabase>(
    caller: Caller,
    body: web::Json<Event>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let event = api.create_event(body.into_inner(), caller.session()).await?;
    Ok(HttpResponse::Ok().json(event))
}

route!(event_prices => Get "/events/{id}/prices" impl TicketingDatabase where requires [Privilege::Sell]);
pub async fn event_prices<B: TicketingDatabase>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let event = EventId(path.into_inner());
    let prices = api.event_prices(&event, caller.session()).await?;
    Ok(HttpResponse::Ok().json(prices))
}

route!(will_call => Get "/events/{id}/orders" impl TicketingDatabase where requires [Privilege::Sell]);
pub async fn will_call<B: TicketingDatabase>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let event = EventId(path.into_inner());
    let list = api.will_call(&event, caller.session()).await?;
    Ok(HttpResponse::Ok().json(list))
}

//----------------------------------------------   Door  ----------------------------------------------------
route!(preview_usage => Get "/events/{id}/tickets/{order}" impl TicketingDatabase where requires [Privilege::Sell, Privilege::Admit]);
/// Called when the door app scans an order. Nothing is written; the counts come back with a scan session token.
pub async fn preview_usage<B: TicketingDatabase>(
    caller: Caller,
    path: web::Path<(String, String)>,
    api: web::Data<TicketUsageApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (event, order) = path.into_inner();
    let event = EventId(event);
    let lookup = OrderLookup::parse(&order);
    trace!("💻️ GET usage of order {order} at {event}");
    match api.preview(&event, &lookup, caller.session()).await {
        Ok(preview) => Ok(HttpResponse::Ok().json(preview)),
        Err(TicketUsageError::Refused { id, name, reason }) => {
            Ok(HttpResponse::Ok().json(UsageRefusal { id: Some(id), name, error: reason.to_string() }))
        },
        Err(e) => Err(e.into()),
    }
}

route!(apply_usage => Post "/events/{id}/tickets/{order}" impl TicketingDatabase where requires [Privilege::Sell, Privilege::Admit]);
/// Records the usage counts for a scan session. `free` in place of the order creates a walk-up free entry order.
pub async fn apply_usage<B: TicketingDatabase>(
    caller: Caller,
    path: web::Path<(String, String)>,
    body: web::Json<UsageChange>,
    api: web::Data<TicketUsageApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (event, order) = path.into_inner();
    let event = EventId(event);
    let lookup = OrderLookup::parse(&order);
    let UsageChange { scan, classes } = body.into_inner();
    debug!("💻️ POST usage of order {order} at {event} in scan session {scan}");
    match api.apply(&event, &lookup, &scan, &classes, caller.session()).await {
        Ok(stored) => {
            let id = stored.id.ok_or_else(|| ServerError::BackendError("The stored order has no id".into()))?;
            Ok(HttpResponse::Ok().json(UsageRecorded { id, scan }))
        },
        Err(TicketUsageError::Usage(reason)) if reason.is_informational() => {
            let id = match lookup {
                OrderLookup::Id(id) => Some(id),
                _ => None,
            };
            Ok(HttpResponse::Ok().json(UsageRefusal { id, name: None, error: reason.to_string() }))
        },
        Err(e) => Err(e.into()),
    }
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(create_product => Post "/products" impl TicketingDatabase where requires [Privilege::Setup]);
pub async fn create_product<B: TicketingDatabase>(
    caller: Caller,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = Product::from(body.into_inner());
    let product = api.create_product(product, caller.session()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(add_price_rule => Post "/products/{id}/rules" impl TicketingDatabase where requires [Privilege::Setup]);
pub async fn add_price_rule<B: TicketingDatabase>(
    caller: Caller,
    path: web::Path<String>,
    body: web::Json<PriceRule>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = ProductId(path.into_inner());
    let rule = api.add_price_rule(&product, body.into_inner(), caller.session()).await?;
    Ok(HttpResponse::Ok().json(rule))
}

//----------------------------------------------   Sessions  ----------------------------------------------------
route!(open_session => Post "/sessions" impl SessionProvider where requires [Privilege::Setup]);
pub async fn open_session<B: SessionProvider>(
    caller: Caller,
    body: web::Json<NewSession>,
    api: web::Data<SessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewSession { username, member, privileges } = body.into_inner();
    let session = api.open_session(&username, member, privileges, caller.session()).await?;
    Ok(HttpResponse::Ok().json(IssuedSession::from(session)))
}

//----------------------------------------------   Terminal  ----------------------------------------------------
route!(terminal_connection => Get "/stripe/connect" requires [Privilege::Sell]);
/// A connection token for the card reader at the door.
pub async fn terminal_connection(api: web::Data<StripeApi>) -> Result<HttpResponse, ServerError> {
    let secret = api.connection_token().await.map_err(|e| {
        error!("💻️💳️ Could not fetch a terminal connection token. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(TerminalConnection { secret }))
}
