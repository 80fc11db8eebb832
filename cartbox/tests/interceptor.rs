use cartbox::{
    ConfigRequestEvent, Interceptor, MutationKey, MutationKind, ResolveError, ResolvedTarget,
    RewriteDecision, Settlement, Storefront, TableLookup,
};
use cartbox_core::{ConfigurationControl, Document, MemoryDocument, Selection};
use http::{HeaderMap, HeaderValue};

const COUNTER: &str = "cart-counter";

fn event(path: &str, target: &'static str, current_url: &'static str) -> ConfigRequestEvent {
    let mut headers = HeaderMap::new();
    headers.insert("hx-target", HeaderValue::from_static(target));
    headers.insert("hx-current-url", HeaderValue::from_static(current_url));
    ConfigRequestEvent::new(path, headers)
}

fn laptop_listing(counter: &str) -> MemoryDocument {
    MemoryDocument::new()
        .with_control(42, ConfigurationControl::new("price", "/products/42/prices/7").selected())
        .with_control(42, ConfigurationControl::new("price", "/products/42/prices/8"))
        .with_control(43, ConfigurationControl::new("price", "/products/43/prices/9"))
        .with_element(COUNTER, counter)
}

fn counter(page: &MemoryDocument) -> Option<String> {
    page.text_content(COUNTER)
}

#[test]
fn test_add_from_listing_page() {
    let interceptor = Interceptor::default();
    let mut page = laptop_listing("3");
    let mut event = event("/cart/add", "product42counter", "https://shop.test/laptops");

    let decision = interceptor.handle(&mut event, &mut page);

    assert_eq!(
        decision.key(),
        Some(MutationKey::new(ResolvedTarget::new(42, 7), MutationKind::Add))
    );
    assert_eq!(event.path(), "/cart/add?configuration_id=7&product_id=42");
    assert_eq!(counter(&page).as_deref(), Some("4"));
    assert!(!event.is_cancelled());
}

#[test]
fn test_remove_from_cart_view() {
    let interceptor = Interceptor::default();
    let mut page = MemoryDocument::new().with_element(COUNTER, "2");
    let mut event = event("/cart/remove", "product42counter7", "https://shop.test/cart");

    assert!(interceptor.handle(&mut event, &mut page).is_rewrite());
    assert_eq!(event.path(), "/cart/remove?configuration_id=7&product_id=42");
    assert_eq!(counter(&page).as_deref(), Some("1"));
}

#[test]
fn test_add_from_cart_view_uses_line_configuration() {
    let interceptor = Interceptor::default();
    // The line's configuration wins over whatever is selected on the page.
    let mut page = laptop_listing("1");
    let mut event = event("/cart/add", "product42counter8", "https://shop.test/cart?step=1");

    interceptor.handle(&mut event, &mut page);
    assert_eq!(event.path(), "/cart/add?configuration_id=8&product_id=42");
    assert_eq!(counter(&page).as_deref(), Some("2"));
}

#[test]
fn test_unresolved_target_leaves_request_and_counter_alone() {
    let interceptor = Interceptor::default();
    let cases = [
        // no selected price for product 43
        ("product43counter", "https://shop.test/laptops"),
        // unknown product
        ("product99counter", "https://shop.test/laptops"),
        // not a product element
        ("checkout-button", "https://shop.test/laptops"),
        // cart line without a configuration id
        ("product42counter", "https://shop.test/cart"),
    ];

    for (target, url) in cases {
        let mut page = laptop_listing("5");
        let mut event = event("/cart/add?ref=grid", target, url);

        let decision = interceptor.handle(&mut event, &mut page);

        assert!(
            matches!(decision, RewriteDecision::Failed(_)),
            "{target} on {url}: {decision:?}"
        );
        assert_eq!(event.path(), "/cart/add?ref=grid");
        assert_eq!(counter(&page).as_deref(), Some("5"));
        assert!(event.ticket().is_none());
        assert!(!event.is_cancelled());
    }
    assert!(interceptor.pending().is_empty());
}

#[test]
fn test_ambiguous_selection_is_reported() {
    let interceptor = Interceptor::default();
    let mut page = laptop_listing("0")
        .with_control(42, ConfigurationControl::new("price", "/products/42/prices/10").selected());
    let mut event = event("/cart/add", "product42counter", "https://shop.test/");

    match interceptor.handle(&mut event, &mut page) {
        RewriteDecision::Failed(ResolveError::NoSelection { found, .. }) => assert_eq!(found, 2),
        other => panic!("expected ambiguous selection, got {other:?}"),
    }
    assert_eq!(event.path(), "/cart/add");
}

#[test]
fn test_existing_query_is_merged() {
    let interceptor = Interceptor::default();
    let mut page = laptop_listing("0");
    let mut event = event(
        "/cart/add?ref=grid&configuration_id=1#top",
        "product42counter",
        "https://shop.test/",
    );

    interceptor.handle(&mut event, &mut page);
    assert_eq!(
        event.path(),
        "/cart/add?ref=grid&configuration_id=7&product_id=42#top"
    );
}

#[test]
fn test_selection_follows_page_state() {
    let interceptor = Interceptor::default();
    let mut page = laptop_listing("0");

    let mut first = event("/cart/add", "product42counter", "https://shop.test/");
    interceptor.handle(&mut first, &mut page);
    assert_eq!(first.path(), "/cart/add?configuration_id=7&product_id=42");

    assert!(page.select(42, "/products/42/prices/8"));
    let mut second = event("/cart/add", "product42counter", "https://shop.test/");
    interceptor.handle(&mut second, &mut page);
    assert_eq!(second.path(), "/cart/add?configuration_id=8&product_id=42");
    assert_eq!(counter(&page).as_deref(), Some("2"));
}

#[test]
fn test_multi_attribute_table_lookup() {
    let selection: Selection = [("ram", "/ram/16"), ("storage", "/storage/512")]
        .into_iter()
        .collect();
    let interceptor = Interceptor::builder()
        .attributes(["ram", "storage"])
        .lookup(TableLookup::new().with_product_entry(42, selection, 31))
        .build();
    let mut page = MemoryDocument::new()
        .with_control(42, ConfigurationControl::new("ram", "/ram/16").selected())
        .with_control(42, ConfigurationControl::new("storage", "/storage/512").selected())
        .with_element(COUNTER, "0");
    let mut event = event("/cart/add", "product42counter", "https://shop.test/");

    interceptor.handle(&mut event, &mut page);
    assert_eq!(event.path(), "/cart/add?configuration_id=31&product_id=42");

    page.clear_selection(42);
    assert!(page.select(42, "/ram/16"));
    let mut event = self::event("/cart/add", "product42counter", "https://shop.test/");
    match interceptor.handle(&mut event, &mut page) {
        RewriteDecision::Failed(ResolveError::NoSelection { attribute, found, .. }) => {
            assert_eq!(attribute, "storage");
            assert_eq!(found, 0);
        }
        other => panic!("expected missing storage selection, got {other:?}"),
    }
    assert_eq!(counter(&page).as_deref(), Some("1"));
}

#[test]
fn test_remove_never_goes_below_zero() {
    let interceptor = Interceptor::default();
    let mut page = MemoryDocument::new().with_element(COUNTER, "0");
    let mut event = event("/cart/remove", "product42counter7", "https://shop.test/cart");

    interceptor.handle(&mut event, &mut page);
    assert_eq!(counter(&page).as_deref(), Some("0"));
}

#[test]
fn test_failed_mutation_reverts_counter_and_releases_key() {
    let mut storefront = Storefront::new(Interceptor::default(), laptop_listing("3"));
    storefront.initialize();

    let mut first = event("/cart/add", "product42counter", "https://shop.test/");
    storefront.dispatch(&mut first);
    assert_eq!(counter(&storefront.document().lock()).as_deref(), Some("4"));

    let mut duplicate = event("/cart/add", "product42counter", "https://shop.test/");
    storefront.dispatch(&mut duplicate);
    assert!(duplicate.is_cancelled());
    assert_eq!(counter(&storefront.document().lock()).as_deref(), Some("4"));

    let ticket = first.take_ticket().unwrap();
    storefront.settle(ticket, Settlement::Failed);
    assert_eq!(counter(&storefront.document().lock()).as_deref(), Some("3"));
    assert!(storefront.interceptor().pending().is_empty());

    let mut retry = event("/cart/add", "product42counter", "https://shop.test/");
    storefront.dispatch(&mut retry);
    assert!(!retry.is_cancelled());
    storefront.settle(retry.take_ticket().unwrap(), Settlement::Confirmed);
    assert_eq!(counter(&storefront.document().lock()).as_deref(), Some("4"));
}

#[test]
fn test_revert_is_relative_to_current_count() {
    let mut storefront = Storefront::new(Interceptor::default(), laptop_listing("3"));
    storefront.initialize();

    let mut add = event("/cart/add", "product42counter", "https://shop.test/");
    storefront.dispatch(&mut add);
    // The page re-rendered the counter from the server meanwhile.
    storefront.document().lock().set_text_content(COUNTER, "10");

    storefront.settle(add.take_ticket().unwrap(), Settlement::Failed);
    assert_eq!(counter(&storefront.document().lock()).as_deref(), Some("9"));
}
