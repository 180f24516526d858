//! Near-duplicate city removal.
//!
//! `GeoNames` often carries the same town twice (a `PPL` and a `PPLA3`
//! record a few hundred meters apart, say). Candidates are first
//! deduplicated on their name and administrative parents, then clustered
//! by distance, keeping the most populous member of each cluster.

use std::collections::BTreeMap;

use geo::{Distance, Haversine, Point};
use geoscrub_gazetteer_models::Entity;

/// Great-circle distance between two entities in kilometers.
#[must_use]
pub fn distance_km(a: &Entity, b: &Entity) -> f64 {
    Haversine.distance(
        Point::new(a.longitude, a.latitude),
        Point::new(b.longitude, b.latitude),
    ) / 1000.0
}

type DedupKey<'a> = (&'a str, Option<&'a str>, Option<&'a str>, &'a str);

/// Removes near-duplicate cities.
///
/// Returns one entity per cluster, most populous first. Running this on
/// its own output changes nothing.
#[must_use]
pub fn dedup<'a>(cities: &[&'a Entity], threshold_km: f64) -> Vec<&'a Entity> {
    let mut unique: Vec<&'a Entity> = Vec::with_capacity(cities.len());
    let mut seen: BTreeMap<DedupKey<'a>, usize> = BTreeMap::new();

    for &city in cities {
        let key = (
            city.name.as_str(),
            city.admin_codes.admin2.as_deref(),
            city.admin_codes.admin1.as_deref(),
            city.country_code.as_str(),
        );
        match seen.get(&key) {
            Some(&i) => {
                if city.population > unique[i].population {
                    unique[i] = city;
                }
            }
            None => {
                seen.insert(key, unique.len());
                unique.push(city);
            }
        }
    }

    let mut clusters = Clusters::new(unique.len());
    for i in 0..unique.len() {
        for j in (i + 1)..unique.len() {
            if distance_km(unique[i], unique[j]) < threshold_km {
                clusters.union(i, j);
            }
        }
    }

    let mut best: BTreeMap<usize, usize> = BTreeMap::new();
    for i in 0..unique.len() {
        let root = clusters.find(i);
        let current = best.entry(root).or_insert(i);
        if unique[i].population > unique[*current].population {
            *current = i;
        }
    }

    let mut kept: Vec<usize> = best.into_values().collect();
    kept.sort_unstable();

    let before = unique.len();
    let mut result: Vec<&'a Entity> = kept.into_iter().map(|i| unique[i]).collect();
    result.sort_by(|a, b| b.population.cmp(&a.population));

    if result.len() < cities.len() {
        log::debug!(
            "dedup: {} candidates -> {before} unique -> {} clusters",
            cities.len(),
            result.len()
        );
    }

    result
}

/// Disjoint-set forest over candidate indices.
struct Clusters {
    parent: Vec<usize>,
}

impl Clusters {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
