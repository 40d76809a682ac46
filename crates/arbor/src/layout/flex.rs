use std::cmp::Ordering;

/// The sizing requirement of one flexible child along its container's
/// growth axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlexItem {
    /// Relative share of leftover space. Zero never grows past `min`.
    pub factor: u32,
    /// Smallest allocation.
    pub min: u32,
    /// Largest allocation, if bounded.
    pub max: Option<u32>,
}

impl FlexItem {
    /// Construct an item. A minimum above the maximum is lowered to it.
    pub fn new(factor: u32, min: u32, max: Option<u32>) -> Self {
        let min = max.map_or(min, |m| min.min(m));
        Self { factor, min, max }
    }
}

/// Split `budget` cells between flexible items.
///
/// Each item gets `budget * factor / total_factor`. Shares that fall outside
/// an item's `[min, max]` are clamped, the clamped items are settled, and the
/// remaining budget is redistributed among the rest until no share needs
/// clamping. Every pass settles at least one item, so the loop ends after at
/// most `items.len()` passes. Fractional cells go to the largest remainders,
/// with ties going to the earlier item.
///
/// A zero budget gives every item its minimum. When the minimums alone exceed
/// the budget, allocations shrink in proportion to their minimums.
pub fn distribute(budget: u32, items: &[FlexItem]) -> Vec<u32> {
    if items.is_empty() {
        return Vec::new();
    }
    if budget == 0 {
        return items.iter().map(|i| i.min).collect();
    }
    let budget = u64::from(budget);
    let min_total: u64 = items.iter().map(|i| u64::from(i.min)).sum();
    if min_total > budget {
        let weights: Vec<u64> = items.iter().map(|i| u64::from(i.min)).collect();
        return apportion(budget, &weights);
    }

    let mut settled: Vec<Option<u32>> = items
        .iter()
        .map(|i| (i.factor == 0).then_some(i.min))
        .collect();

    for _ in 0..=items.len() {
        let open: Vec<usize> = (0..items.len()).filter(|i| settled[*i].is_none()).collect();
        if open.is_empty() {
            break;
        }
        let remaining = budget.saturating_sub(settled_total(&settled));
        let total_factor: u64 = open.iter().map(|i| u64::from(items[*i].factor)).sum();

        // All quantities are scaled by total_factor so the comparison is exact.
        let mut delta: i128 = 0;
        let mut below = Vec::new();
        let mut above = Vec::new();
        for &i in &open {
            let item = items[i];
            let share = i128::from(remaining) * i128::from(item.factor);
            let min = i128::from(item.min) * i128::from(total_factor);
            if share < min {
                delta += min - share;
                below.push(i);
            } else if let Some(max) = item.max {
                let max = i128::from(max) * i128::from(total_factor);
                if share > max {
                    delta += max - share;
                    above.push(i);
                }
            }
        }
        if below.is_empty() && above.is_empty() {
            break;
        }
        match delta.cmp(&0) {
            Ordering::Greater => settle_at_min(&mut settled, items, &below),
            Ordering::Less => settle_at_max(&mut settled, items, &above),
            Ordering::Equal => {
                settle_at_min(&mut settled, items, &below);
                settle_at_max(&mut settled, items, &above);
            }
        }
    }

    let open: Vec<usize> = (0..items.len()).filter(|i| settled[*i].is_none()).collect();
    let remaining = budget.saturating_sub(settled_total(&settled));
    let weights: Vec<u64> = open.iter().map(|i| u64::from(items[*i].factor)).collect();
    let shares = apportion(remaining, &weights);
    for (i, share) in open.into_iter().zip(shares) {
        settled[i] = Some(share);
    }
    settled
        .into_iter()
        .zip(items)
        .map(|(s, item)| s.unwrap_or(item.min))
        .collect()
}

/// Sum of the settled allocations.
fn settled_total(settled: &[Option<u32>]) -> u64 {
    settled.iter().flatten().map(|v| u64::from(*v)).sum()
}

/// Settle the listed items at their minimum.
fn settle_at_min(settled: &mut [Option<u32>], items: &[FlexItem], which: &[usize]) {
    for &i in which {
        settled[i] = Some(items[i].min);
    }
}

/// Settle the listed items at their maximum.
fn settle_at_max(settled: &mut [Option<u32>], items: &[FlexItem], which: &[usize]) {
    for &i in which {
        settled[i] = Some(items[i].max.unwrap_or(items[i].min));
    }
}

/// Split `total` in proportion to `weights` using largest-remainder rounding.
/// Ties go to the earlier index. All-zero weights allocate nothing.
fn apportion(total: u64, weights: &[u64]) -> Vec<u32> {
    let sum: u64 = weights.iter().sum();
    if sum == 0 {
        return vec![0; weights.len()];
    }
    let mut out = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    let mut used = 0u64;
    for (idx, w) in weights.iter().enumerate() {
        let scaled = u128::from(total) * u128::from(*w);
        let base = u64::try_from(scaled / u128::from(sum)).unwrap_or(u64::MAX);
        let rem = scaled % u128::from(sum);
        used = used.saturating_add(base);
        out.push(base);
        remainders.push((idx, rem));
    }
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let leftover = total.saturating_sub(used);
    for (idx, _) in remainders.into_iter().take(usize::try_from(leftover).unwrap_or(usize::MAX)) {
        out[idx] += 1;
    }
    out.into_iter()
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .collect()
}
