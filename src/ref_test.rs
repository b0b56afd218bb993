// Reference model for a tree whose keys are drawn from 0..capacity. Every
// key remembers which pool of records currently holds it linked.
struct RefNodes {
    entries: Vec<Option<usize>>,
}

impl RefNodes {
    fn new(capacity: usize) -> RefNodes {
        RefNodes {
            entries: vec![None; capacity],
        }
    }

    fn get(&self, key: i64) -> Option<usize> {
        self.entries[key as usize]
    }

    fn insert(&mut self, key: i64, pool: usize) -> Result<(), Error> {
        match self.entries[key as usize] {
            Some(owner) if owner == pool => Err(Error::AlreadyLinked),
            Some(_) => Err(Error::DuplicateKey),
            None => {
                self.entries[key as usize] = Some(pool);
                Ok(())
            }
        }
    }

    fn remove(&mut self, key: i64, pool: usize) -> Result<(), Error> {
        match self.entries[key as usize] {
            Some(owner) if owner == pool => {
                self.entries[key as usize] = None;
                Ok(())
            }
            _ => Err(Error::NotFound),
        }
    }

    fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    fn next(&self, key: i64) -> Option<i64> {
        let from = (key + 1) as usize;
        (from..self.entries.len())
            .find(|k| self.entries[*k].is_some())
            .map(|k| k as i64)
    }

    fn prev(&self, key: i64) -> Option<i64> {
        (0..key as usize)
            .rev()
            .find(|k| self.entries[*k].is_some())
            .map(|k| k as i64)
    }

    fn iter(&self) -> std::vec::IntoIter<i64> {
        self.range(Bound::Unbounded, Bound::Unbounded)
    }

    fn range(&self, low: Bound<i64>, high: Bound<i64>) -> std::vec::IntoIter<i64> {
        let low = match low {
            Bound::Included(low) => low as usize,
            Bound::Excluded(low) => (low + 1) as usize,
            Bound::Unbounded => 0,
        };
        let high = match high {
            Bound::Included(high) => (high + 1) as usize,
            Bound::Excluded(high) => high as usize,
            Bound::Unbounded => self.entries.len(),
        };
        let ok = low < self.entries.len();
        let ok = ok && (high >= low && high <= self.entries.len());
        let entries = if ok {
            &self.entries[low..high]
        } else {
            &self.entries[..0]
        };

        entries
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.map(|_| (low + i) as i64))
            .collect::<Vec<i64>>()
            .into_iter()
    }

    fn reverse(&self, low: Bound<i64>, high: Bound<i64>) -> std::vec::IntoIter<i64> {
        let mut keys: Vec<i64> = self.range(low, high).collect();
        keys.reverse();
        keys.into_iter()
    }
}

fn random_low_high(size: usize) -> (Bound<i64>, Bound<i64>) {
    let size = size as u64;
    let low = (random::<u64>() % size) as i64;
    let high = (random::<u64>() % size) as i64;
    let low = match random::<u8>() % 3 {
        0 => Bound::Included(low),
        1 => Bound::Excluded(low),
        2 => Bound::Unbounded,
        _ => unreachable!(),
    };
    let high = match random::<u8>() % 3 {
        0 => Bound::Included(high),
        1 => Bound::Excluded(high),
        2 => Bound::Unbounded,
        _ => unreachable!(),
    };
    (low, high)
}
