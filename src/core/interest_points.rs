use super::error::Result;
use super::math::bisect;
use super::paths::PricedPath;
use super::types::{PriceOfInterest, SwapType};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
enum Event {
    Spot(usize),
    // The first path starts cheaper; past the crossing the second one is
    // cheaper at equal traded amounts.
    Cross(usize, usize),
    Limit(usize),
}

pub fn process_interest_points(
    paths: &[PricedPath],
    swap_type: SwapType,
    max_pools: usize,
) -> Result<Vec<PriceOfInterest>> {
    let mut rank: Vec<usize> = (0..paths.len()).collect();
    rank.sort_by(|&a, &b| compare_paths(&paths[a], &paths[b]));

    let mut events: Vec<(Decimal, Event)> = Vec::new();
    for (i, path) in paths.iter().enumerate() {
        events.push((path.spot_price(), Event::Spot(i)));
        if path.limit() > Decimal::ZERO {
            events.push((path.marginal_price(path.limit())?, Event::Limit(i)));
        }
    }
    for (pos, &a) in rank.iter().enumerate() {
        for &b in &rank[pos + 1..] {
            if let Some(price) = crossing_price(&paths[a], &paths[b])? {
                events.push((price, Event::Cross(a, b)));
            }
        }
    }

    events.sort_by(|(pa, ea), (pb, eb)| {
        pa.cmp(pb)
            .then_with(|| event_key(paths, ea).cmp(&event_key(paths, eb)))
    });

    let mut order = rank;
    let mut points: Vec<PriceOfInterest> = Vec::new();
    let mut idx = 0;
    while idx < events.len() {
        let price = events[idx].0;
        // Equal prices merge into one point; apply every swap first.
        while idx < events.len() && events[idx].0 == price {
            if let Event::Cross(a, b) = events[idx].1 {
                swap_rank(&mut order, a, b);
            }
            idx += 1;
        }

        let mut path_ids = Vec::new();
        let mut amounts = Vec::new();
        for &i in order
            .iter()
            .filter(|&&i| paths[i].spot_price() <= price)
            .take(max_pools)
        {
            path_ids.push(paths[i].id().to_string());
            amounts.push(paths[i].amount_for_price(price)?);
        }
        points.push(PriceOfInterest {
            price,
            path_ids,
            amounts,
        });
    }

    debug!(%swap_type, paths = paths.len(), points = points.len(), "extracted prices of interest");
    Ok(points)
}

fn crossing_price(cheaper: &PricedPath, dearer: &PricedPath) -> Result<Option<Decimal>> {
    if cheaper.spot_price() >= dearer.spot_price() {
        return Ok(None);
    }
    let cap = cheaper.limit().min(dearer.limit());
    if cap <= Decimal::ZERO || cheaper.marginal_price(cap)? < dearer.marginal_price(cap)? {
        return Ok(None);
    }
    let (_, amount) = bisect(Decimal::ZERO, cap, |amount| {
        Ok(cheaper.marginal_price(amount)? >= dearer.marginal_price(amount)?)
    })?;
    Ok(Some(cheaper.marginal_price(amount)?))
}

fn swap_rank(order: &mut [usize], a: usize, b: usize) {
    let pos_a = order.iter().position(|&i| i == a);
    let pos_b = order.iter().position(|&i| i == b);
    if let (Some(pa), Some(pb)) = (pos_a, pos_b) {
        if pa < pb {
            order.swap(pa, pb);
        }
    }
}

fn compare_paths(a: &PricedPath, b: &PricedPath) -> Ordering {
    a.spot_price()
        .cmp(&b.spot_price())
        .then_with(|| a.id().cmp(b.id()))
}

fn event_key<'a>(paths: &'a [PricedPath], event: &Event) -> (&'a str, &'a str) {
    match *event {
        Event::Spot(i) | Event::Limit(i) => (paths[i].id(), ""),
        Event::Cross(a, b) => (paths[a].id(), paths[b].id()),
    }
}
