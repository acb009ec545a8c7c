//! Competitive-learning color quantizer.
//!
//! A 256-neuron self-organizing network trained over the pixel stream in BGR
//! space, after Kohonen. Training decays the learning rate and neighborhood
//! radius across 100 cycles; afterwards the neurons are unbiased back to byte
//! range and sorted by green to build a two-direction nearest-neighbor index.
//! One quantizer instance serves exactly one frame analysis.

const NETSIZE: usize = 256;

const PRIME1: usize = 499;
const PRIME2: usize = 491;
const PRIME3: usize = 487;
const PRIME4: usize = 503;
const MIN_PICTURE_BYTES: usize = 3 * PRIME4;

const MAX_NET_POS: usize = NETSIZE - 1;
const NET_BIAS_SHIFT: i32 = 4;
const N_CYCLES: i32 = 100;

const INT_BIAS_SHIFT: i32 = 16;
const INT_BIAS: i32 = 1 << INT_BIAS_SHIFT;
const GAMMA_SHIFT: i32 = 10;
const BETA_SHIFT: i32 = 10;
const BETA: i32 = INT_BIAS >> BETA_SHIFT;
const BETA_GAMMA: i32 = INT_BIAS << (GAMMA_SHIFT - BETA_SHIFT);

const INIT_RAD: usize = NETSIZE >> 3;
const RADIUS_BIAS_SHIFT: i32 = 6;
const RADIUS_BIAS: i32 = 1 << RADIUS_BIAS_SHIFT;
const INIT_RADIUS: i32 = (INIT_RAD as i32) * RADIUS_BIAS;
const RADIUS_DEC: i32 = 30;

const ALPHA_BIAS_SHIFT: i32 = 10;
const INIT_ALPHA: i32 = 1 << ALPHA_BIAS_SHIFT;

const RAD_BIAS_SHIFT: i32 = 8;
const RAD_BIAS: i32 = 1 << RAD_BIAS_SHIFT;
const ALPHA_RAD_BIAS: i32 = 1 << (ALPHA_BIAS_SHIFT + RAD_BIAS_SHIFT);

pub struct ColorQuantizer {
    pixels: Vec<u8>,
    samplefac: i32,
    /// Neuron entries `[b, g, r, original_index]`, in network bias units
    /// until `unbias` runs.
    network: Vec<[i32; 4]>,
    netindex: [i32; 256],
    bias: [i32; NETSIZE],
    freq: [i32; NETSIZE],
    radpower: [i32; INIT_RAD],
    trained: bool,
}

impl ColorQuantizer {
    /// `pixels` is a packed RGB byte stream; `sample` is the sampling
    /// interval (1-30, lower is higher quality).
    pub fn new(pixels: Vec<u8>, sample: u8) -> Self {
        let mut network = Vec::with_capacity(NETSIZE);
        let mut freq = [0i32; NETSIZE];
        for (i, freq_slot) in freq.iter_mut().enumerate() {
            let v = ((i << (NET_BIAS_SHIFT as usize + 8)) / NETSIZE) as i32;
            network.push([v, v, v, 0]);
            *freq_slot = INT_BIAS / NETSIZE as i32;
        }

        Self {
            pixels,
            samplefac: sample.clamp(1, 30) as i32,
            network,
            netindex: [0; 256],
            bias: [0; NETSIZE],
            freq,
            radpower: [0; INIT_RAD],
            trained: false,
        }
    }

    /// Trains the network and builds the lookup index. Idempotent.
    pub fn build_colormap(&mut self) {
        if self.trained {
            return;
        }
        self.learn();
        self.unbias();
        self.inxbuild();
        self.trained = true;
    }

    /// Flat RGB triples, ordered by original neuron index so that
    /// `lookup_rgb` results index directly into it.
    pub fn color_map(&self) -> Vec<u8> {
        let mut position = [0usize; NETSIZE];
        for (i, neuron) in self.network.iter().enumerate() {
            position[neuron[3] as usize] = i;
        }
        let mut map = Vec::with_capacity(NETSIZE * 3);
        for slot in position {
            let neuron = self.network[slot];
            map.push(neuron[2] as u8);
            map.push(neuron[1] as u8);
            map.push(neuron[0] as u8);
        }
        map
    }

    /// Nearest palette index for a color, via the green-sorted index walked
    /// in both directions under a running best-distance cutoff.
    pub fn lookup_rgb(&self, b: u8, g: u8, r: u8) -> usize {
        let (b, g, r) = (b as i32, g as i32, r as i32);
        let mut bestd = 1000;
        let mut best = 0;

        let mut i = self.netindex[g as usize];
        let mut j = i - 1;

        while i < NETSIZE as i32 || j >= 0 {
            if i < NETSIZE as i32 {
                let p = self.network[i as usize];
                let mut dist = p[1] - g;
                if dist >= bestd {
                    i = NETSIZE as i32;
                } else {
                    i += 1;
                    if dist < 0 {
                        dist = -dist;
                    }
                    let mut a = p[0] - b;
                    if a < 0 {
                        a = -a;
                    }
                    dist += a;
                    if dist < bestd {
                        a = p[2] - r;
                        if a < 0 {
                            a = -a;
                        }
                        dist += a;
                        if dist < bestd {
                            bestd = dist;
                            best = p[3];
                        }
                    }
                }
            }
            if j >= 0 {
                let p = self.network[j as usize];
                let mut dist = g - p[1];
                if dist >= bestd {
                    j = -1;
                } else {
                    j -= 1;
                    if dist < 0 {
                        dist = -dist;
                    }
                    let mut a = p[0] - b;
                    if a < 0 {
                        a = -a;
                    }
                    dist += a;
                    if dist < bestd {
                        a = p[2] - r;
                        if a < 0 {
                            a = -a;
                        }
                        dist += a;
                        if dist < bestd {
                            bestd = dist;
                            best = p[3];
                        }
                    }
                }
            }
        }

        best as usize
    }

    fn learn(&mut self) {
        let lengthcount = self.pixels.len();
        if lengthcount < 3 {
            return;
        }
        if lengthcount < MIN_PICTURE_BYTES {
            self.samplefac = 1;
        }

        let alphadec = 30 + (self.samplefac - 1) / 3;
        let samplepixels = (lengthcount / 3) as i32 / self.samplefac;
        let delta = (samplepixels / N_CYCLES).max(1);
        let mut alpha = INIT_ALPHA;
        let mut radius = INIT_RADIUS;

        let mut rad = (radius >> RADIUS_BIAS_SHIFT) as usize;
        if rad <= 1 {
            rad = 0;
        }
        self.fill_radpower(rad, alpha);

        let step = if lengthcount < MIN_PICTURE_BYTES {
            3
        } else if lengthcount % PRIME1 != 0 {
            3 * PRIME1
        } else if lengthcount % PRIME2 != 0 {
            3 * PRIME2
        } else if lengthcount % PRIME3 != 0 {
            3 * PRIME3
        } else {
            3 * PRIME4
        };

        let mut pix = 0usize;
        let mut i = 0;
        while i < samplepixels {
            let r = (self.pixels[pix] as i32) << NET_BIAS_SHIFT;
            let g = (self.pixels[pix + 1] as i32) << NET_BIAS_SHIFT;
            let b = (self.pixels[pix + 2] as i32) << NET_BIAS_SHIFT;

            let winner = self.contest(b, g, r);
            self.alter_single(alpha, winner, b, g, r);
            if rad != 0 {
                self.alter_neigh(rad, winner, b, g, r);
            }

            pix += step;
            if pix >= lengthcount {
                pix -= lengthcount;
            }

            i += 1;
            if i % delta == 0 {
                alpha -= alpha / alphadec;
                radius -= radius / RADIUS_DEC;
                rad = (radius >> RADIUS_BIAS_SHIFT) as usize;
                if rad <= 1 {
                    rad = 0;
                }
                self.fill_radpower(rad, alpha);
            }
        }
    }

    fn fill_radpower(&mut self, rad: usize, alpha: i32) {
        for m in 0..rad {
            self.radpower[m] =
                alpha * (((rad * rad - m * m) as i32 * RAD_BIAS) / (rad * rad) as i32);
        }
    }

    /// Finds the best-matching neuron, biased so that frequently-winning
    /// neurons cede to their neighbors over time.
    fn contest(&mut self, b: i32, g: i32, r: i32) -> usize {
        let mut bestd = i32::MAX;
        let mut bestbiasd = i32::MAX;
        let mut bestpos = 0usize;
        let mut bestbiaspos = 0usize;

        for i in 0..NETSIZE {
            let n = self.network[i];
            let mut dist = n[0] - b;
            if dist < 0 {
                dist = -dist;
            }
            let mut a = n[1] - g;
            if a < 0 {
                a = -a;
            }
            dist += a;
            a = n[2] - r;
            if a < 0 {
                a = -a;
            }
            dist += a;

            if dist < bestd {
                bestd = dist;
                bestpos = i;
            }
            let biasdist = dist - (self.bias[i] >> (INT_BIAS_SHIFT - NET_BIAS_SHIFT));
            if biasdist < bestbiasd {
                bestbiasd = biasdist;
                bestbiaspos = i;
            }

            let betafreq = self.freq[i] >> BETA_SHIFT;
            self.freq[i] -= betafreq;
            self.bias[i] += betafreq << GAMMA_SHIFT;
        }

        self.freq[bestpos] += BETA;
        self.bias[bestpos] -= BETA_GAMMA;
        bestbiaspos
    }

    fn alter_single(&mut self, alpha: i32, i: usize, b: i32, g: i32, r: i32) {
        let n = &mut self.network[i];
        n[0] -= alpha * (n[0] - b) / INIT_ALPHA;
        n[1] -= alpha * (n[1] - g) / INIT_ALPHA;
        n[2] -= alpha * (n[2] - r) / INIT_ALPHA;
    }

    fn alter_neigh(&mut self, rad: usize, i: usize, b: i32, g: i32, r: i32) {
        let lo = (i as i32 - rad as i32).max(-1);
        let hi = ((i + rad) as i32).min(NETSIZE as i32);

        let mut j = i as i32 + 1;
        let mut k = i as i32 - 1;
        let mut m = 1usize;
        while j < hi || k > lo {
            let a = self.radpower[m];
            m += 1;
            if j < hi {
                let n = &mut self.network[j as usize];
                n[0] -= a * (n[0] - b) / ALPHA_RAD_BIAS;
                n[1] -= a * (n[1] - g) / ALPHA_RAD_BIAS;
                n[2] -= a * (n[2] - r) / ALPHA_RAD_BIAS;
                j += 1;
            }
            if k > lo {
                let n = &mut self.network[k as usize];
                n[0] -= a * (n[0] - b) / ALPHA_RAD_BIAS;
                n[1] -= a * (n[1] - g) / ALPHA_RAD_BIAS;
                n[2] -= a * (n[2] - r) / ALPHA_RAD_BIAS;
                k -= 1;
            }
        }
    }

    fn unbias(&mut self) {
        for (i, neuron) in self.network.iter_mut().enumerate() {
            for channel in neuron.iter_mut().take(3) {
                let value = (*channel + (1 << (NET_BIAS_SHIFT - 1))) >> NET_BIAS_SHIFT;
                *channel = value.clamp(0, 255);
            }
            neuron[3] = i as i32;
        }
    }

    /// Sorts the network by green and records, for every possible green
    /// value, where the two-direction search should start.
    fn inxbuild(&mut self) {
        let mut previouscol = 0i32;
        let mut startpos = 0usize;

        for i in 0..NETSIZE {
            let mut smallpos = i;
            let mut smallval = self.network[i][1];
            for j in (i + 1)..NETSIZE {
                if self.network[j][1] < smallval {
                    smallpos = j;
                    smallval = self.network[j][1];
                }
            }
            if i != smallpos {
                self.network.swap(i, smallpos);
            }

            if smallval != previouscol {
                self.netindex[previouscol as usize] = ((startpos + i) >> 1) as i32;
                for j in (previouscol + 1)..smallval {
                    self.netindex[j as usize] = i as i32;
                }
                previouscol = smallval;
                startpos = i;
            }
        }

        self.netindex[previouscol as usize] = ((startpos + MAX_NET_POS) >> 1) as i32;
        for j in (previouscol + 1) as usize..256 {
            self.netindex[j] = MAX_NET_POS as i32;
        }
    }
}
