#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod test_timeseries;

#[cfg(test)]
mod test_topology;

#[cfg(test)]
mod test_channel_length;

#[cfg(test)]
mod test_interception;

#[cfg(test)]
mod test_infiltration;

#[cfg(test)]
mod test_channel_geometry;

#[cfg(test)]
mod test_shear;

#[cfg(test)]
mod test_stack;

#[cfg(test)]
mod test_erosion;

#[cfg(test)]
mod test_supply_rule;

#[cfg(test)]
mod test_ascii_grid;



#[cfg(test)]
mod test_model;
