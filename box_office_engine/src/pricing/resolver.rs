use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Order, OrderSource, PriceRule, Privilege, Session},
    helpers::SharedClock,
};

/// Everything about a purchase that decides which price rules are eligible.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseContext<'a> {
    pub source: OrderSource,
    pub coupon: Option<&'a str>,
    /// The caller may buy at members-only prices.
    pub member_capable: bool,
    /// The caller may buy outside of a rule's sales window.
    pub window_bypass: bool,
}

impl<'a> PurchaseContext<'a> {
    pub fn new(source: OrderSource) -> Self {
        Self { source, coupon: None, member_capable: false, window_bypass: false }
    }

    pub fn with_coupon(mut self, coupon: Option<&'a str>) -> Self {
        self.coupon = coupon.filter(|c| !c.is_empty());
        self
    }

    /// Derives the context for admitting `order` on behalf of `caller`. Office staff (HandleOrders) bypass sales windows.
    pub fn for_order(order: &'a Order, caller: Option<&Session>) -> Self {
        let member_capable = caller.is_some_and(Session::is_member_capable);
        let window_bypass = caller.is_some_and(|s| s.has(Privilege::HandleOrders));
        Self { source: order.source, coupon: None, member_capable, window_bypass }.with_coupon(order.coupon.as_deref())
    }

    /// True if every criterion except the sales window is met.
    pub fn admits(&self, rule: &PriceRule) -> bool {
        if rule.source != self.source {
            return false;
        }
        if let Some(rule_coupon) = rule.coupon.as_deref().filter(|c| !c.is_empty()) {
            match self.coupon {
                Some(c) if c.eq_ignore_ascii_case(rule_coupon) => {},
                _ => return false,
            }
        }
        !rule.members_only || self.member_capable
    }
}

/// Where a rule's sales window sits relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// The window has not opened yet.
    Future(DateTime<Utc>),
    /// The window is open.
    Open,
    /// The window has closed. Carries the window start, if it had one.
    Past(Option<DateTime<Utc>>),
}

impl WindowPosition {
    pub fn of(rule: &PriceRule, now: DateTime<Utc>) -> Self {
        match (rule.sales_start, rule.sales_end) {
            (Some(start), _) if start > now => WindowPosition::Future(start),
            (start, Some(end)) if end <= now => WindowPosition::Past(start),
            _ => WindowPosition::Open,
        }
    }

    /// Sort key in which larger is nearer to now: open windows first, then the most recently closed, then the soonest
    /// to open.
    fn rank(&self) -> (u8, i64) {
        match self {
            WindowPosition::Open => (2, 0),
            WindowPosition::Past(start) => (1, start.map(|s| s.timestamp_millis()).unwrap_or(i64::MIN)),
            WindowPosition::Future(start) => (0, -start.timestamp_millis()),
        }
    }
}

/// Ordering in which `Greater` means `a` is the better rule.
///
/// Window position decides first, then the lower price, then a rule carrying a coupon.
fn preference(a: &PriceRule, b: &PriceRule, now: DateTime<Utc>) -> Ordering {
    let window = WindowPosition::of(a, now).rank().cmp(&WindowPosition::of(b, now).rank());
    window.then_with(|| b.price.cmp(&a.price)).then_with(|| a.has_coupon().cmp(&b.has_coupon()))
}

/// Picks the best rule. On a complete tie the rule listed first wins.
fn best_of<'r, I: Iterator<Item = &'r PriceRule>>(rules: I, now: DateTime<Utc>) -> Option<&'r PriceRule> {
    rules.fold(None, |best, rule| match best {
        Some(b) if preference(rule, b, now) != Ordering::Greater => Some(b),
        _ => Some(rule),
    })
}

/// The outcome of a price lookup for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricePreview<'r> {
    OnSale(&'r PriceRule),
    NotYetOnSale { rule: &'r PriceRule, starts: DateTime<Utc> },
    SalesEnded(&'r PriceRule),
    Unavailable,
}

impl<'r> PricePreview<'r> {
    pub fn rule(&self) -> Option<&'r PriceRule> {
        match self {
            PricePreview::OnSale(r) | PricePreview::SalesEnded(r) => Some(r),
            PricePreview::NotYetOnSale { rule, .. } => Some(rule),
            PricePreview::Unavailable => None,
        }
    }

    /// The message to show in place of a price, if the product cannot be bought right now.
    pub fn message(&self) -> Option<String> {
        match self {
            PricePreview::OnSale(_) | PricePreview::Unavailable => None,
            PricePreview::NotYetOnSale { starts, .. } => Some(format!("Sales start on {}.", starts.format("%B %-d"))),
            PricePreview::SalesEnded(_) => Some("Tickets available at the door.".to_string()),
        }
    }
}

/// Resolves price rules against a clock. Holds no other state.
#[derive(Clone)]
pub struct PriceResolver {
    clock: SharedClock,
}

impl PriceResolver {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The strict variant. Returns the best eligible rule whose window is open now, or the best eligible rule of any
    /// window when the context may bypass sales windows.
    pub fn resolve<'r>(&self, rules: &'r [PriceRule], ctx: &PurchaseContext<'_>) -> Option<&'r PriceRule> {
        Self::resolve_at(rules, ctx, self.now())
    }

    pub fn resolve_at<'r>(
        rules: &'r [PriceRule],
        ctx: &PurchaseContext<'_>,
        now: DateTime<Utc>,
    ) -> Option<&'r PriceRule> {
        let candidates = rules
            .iter()
            .filter(|r| ctx.admits(r))
            .filter(|r| ctx.window_bypass || WindowPosition::of(r, now) == WindowPosition::Open);
        let best = best_of(candidates, now);
        trace!("🏷️ Strict resolution for {} out of {} rules: {best:?}", ctx.source, rules.len());
        best
    }

    /// The preview variant. Near-miss windows are reported so that the caller can explain why the product is not on
    /// sale.
    pub fn preview<'r>(&self, rules: &'r [PriceRule], ctx: &PurchaseContext<'_>) -> PricePreview<'r> {
        Self::preview_at(rules, ctx, self.now())
    }

    pub fn preview_at<'r>(rules: &'r [PriceRule], ctx: &PurchaseContext<'_>, now: DateTime<Utc>) -> PricePreview<'r> {
        let Some(best) = best_of(rules.iter().filter(|r| ctx.admits(r)), now) else {
            return PricePreview::Unavailable;
        };
        if ctx.window_bypass {
            return PricePreview::OnSale(best);
        }
        match WindowPosition::of(best, now) {
            WindowPosition::Open => PricePreview::OnSale(best),
            WindowPosition::Future(starts) => PricePreview::NotYetOnSale { rule: best, starts },
            WindowPosition::Past(_) => PricePreview::SalesEnded(best),
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use box_office_common::Cents;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{
        db_types::{MemberId, Privileges},
        helpers::FixedClock,
    };

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 5, h, 0, 0).unwrap()
    }

    fn rule(price: i64, start: Option<u32>, end: Option<u32>) -> PriceRule {
        PriceRule::new(OrderSource::Public, Cents::from(price)).with_window(start.map(at), end.map(at))
    }

    fn public() -> PurchaseContext<'static> {
        PurchaseContext::new(OrderSource::Public)
    }

    #[test]
    fn coupon_rule_wins_on_price_inside_window() {
        let rules = vec![rule(500, Some(10), Some(12)), rule(400, Some(10), Some(12)).with_coupon("SAVE10")];
        let ctx = public().with_coupon(Some("save10"));
        let best = PriceResolver::resolve_at(&rules, &ctx, at(11)).unwrap();
        assert_eq!(best.price, Cents::from(400));
        // Without the coupon, only the plain rule is eligible
        let best = PriceResolver::resolve_at(&rules, &public(), at(11)).unwrap();
        assert_eq!(best.price, Cents::from(500));
    }

    #[test]
    fn coupon_breaks_price_tie() {
        let rules = vec![rule(400, Some(10), Some(12)), rule(400, Some(10), Some(12)).with_coupon("SAVE10")];
        let ctx = public().with_coupon(Some("SAVE10"));
        let best = PriceResolver::resolve_at(&rules, &ctx, at(11)).unwrap();
        assert!(best.has_coupon());
    }

    #[test]
    fn strict_variant_ignores_closed_windows() {
        let rules = vec![rule(500, Some(10), Some(12))];
        assert!(PriceResolver::resolve_at(&rules, &public(), at(9)).is_none());
        assert!(PriceResolver::resolve_at(&rules, &public(), at(12)).is_none());
        assert!(PriceResolver::resolve_at(&rules, &public(), at(10)).is_some());
        let mut bypass = public();
        bypass.window_bypass = true;
        assert!(PriceResolver::resolve_at(&rules, &bypass, at(9)).is_some());
    }

    #[test]
    fn preview_reports_upcoming_sales() {
        let rules = vec![rule(500, Some(10), Some(12)), rule(400, Some(10), Some(12)).with_coupon("SAVE10")];
        let ctx = public().with_coupon(Some("SAVE10"));
        let preview = PriceResolver::preview_at(&rules, &ctx, at(9));
        assert_eq!(preview, PricePreview::NotYetOnSale { rule: &rules[1], starts: at(10) });
        assert_eq!(preview.message().unwrap(), "Sales start on October 5.");
        let preview = PriceResolver::preview_at(&rules, &ctx, at(13));
        assert_eq!(preview, PricePreview::SalesEnded(&rules[1]));
        assert_eq!(preview.message().unwrap(), "Tickets available at the door.");
        assert_eq!(PriceResolver::preview_at(&rules, &ctx, at(11)), PricePreview::OnSale(&rules[1]));
    }

    #[test]
    fn nearness_outranks_price_when_out_of_range() {
        // Two expired windows: the most recently opened one wins even though it is dearer
        let rules = vec![rule(300, Some(1), Some(3)), rule(900, Some(4), Some(6))];
        let best = PriceResolver::preview_at(&rules, &public(), at(8));
        assert_eq!(best.rule().unwrap().price, Cents::from(900));
        // Two future windows: the soonest one wins
        let rules = vec![rule(300, Some(20), Some(22)), rule(900, Some(15), Some(16))];
        let best = PriceResolver::preview_at(&rules, &public(), at(8));
        assert_eq!(best.rule().unwrap().price, Cents::from(900));
        // A past window beats a future one
        let rules = vec![rule(300, Some(20), Some(22)), rule(900, Some(4), Some(6))];
        let best = PriceResolver::preview_at(&rules, &public(), at(8));
        assert_eq!(best, PricePreview::SalesEnded(&rules[1]));
    }

    #[test]
    fn open_window_beats_cheaper_closed_window() {
        let rules = vec![rule(100, Some(1), Some(3)), rule(800, None, None)];
        let mut ctx = public();
        ctx.window_bypass = true;
        let best = PriceResolver::resolve_at(&rules, &ctx, at(8)).unwrap();
        assert_eq!(best.price, Cents::from(800));
    }

    #[test]
    fn filters_source_and_membership() {
        let rules = vec![
            PriceRule::new(OrderSource::Office, Cents::from(100)),
            PriceRule::new(OrderSource::Public, Cents::from(200)).members_only(),
            PriceRule::new(OrderSource::Public, Cents::from(300)),
        ];
        let best = PriceResolver::resolve_at(&rules, &public(), at(8)).unwrap();
        assert_eq!(best.price, Cents::from(300));
        let mut member = public();
        member.member_capable = true;
        let best = PriceResolver::resolve_at(&rules, &member, at(8)).unwrap();
        assert_eq!(best.price, Cents::from(200));
    }

    #[test]
    fn resolution_is_deterministic() {
        let rules = vec![rule(400, None, None), rule(400, None, None), rule(400, Some(1), None)];
        let first = PriceResolver::resolve_at(&rules, &public(), at(8)).unwrap();
        for _ in 0..10 {
            let again = PriceResolver::resolve_at(&rules, &public(), at(8)).unwrap();
            assert!(std::ptr::eq(first, again));
        }
        assert!(std::ptr::eq(first, &rules[0]));
    }

    #[test]
    fn context_from_order_and_session() {
        let mut order = Order::new(OrderSource::Office);
        order.coupon = Some(String::new());
        let session = Session {
            token: Default::default(),
            username: "office".into(),
            expires: at(23),
            member: Some(MemberId(7)),
            privileges: Privileges::default().with(Privilege::HandleOrders),
        };
        let ctx = PurchaseContext::for_order(&order, Some(&session));
        assert!(ctx.window_bypass);
        assert!(ctx.member_capable);
        assert!(ctx.coupon.is_none());
        let ctx = PurchaseContext::for_order(&order, None);
        assert!(!ctx.window_bypass);
    }

    #[test]
    fn resolver_reads_the_clock() {
        let clock = FixedClock::new(at(9));
        let resolver = PriceResolver::new(Arc::new(clock.clone()));
        let rules = vec![rule(500, Some(10), Some(12))];
        assert!(resolver.resolve(&rules, &public()).is_none());
        clock.advance(Duration::hours(2));
        assert!(resolver.resolve(&rules, &public()).is_some());
    }
}
